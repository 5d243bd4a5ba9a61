use rocket::Route;

pub mod auth;
pub mod checkins;
pub mod groups;
pub mod posts;
pub mod reflections;
pub mod resources;
pub mod tags;
pub mod users;

#[get("/health")]
pub fn api_health() -> &'static str {
    "OK"
}

pub fn routes() -> Vec<Route> {
    routes![
        api_health,
        auth::api_register,
        auth::api_login,
        auth::api_logout,
        auth::api_session,
        users::api_get_user,
        users::api_update_user,
        users::api_onboarding_status,
        users::api_complete_onboarding,
        users::api_roles,
        groups::api_list_groups,
        groups::api_create_group,
        groups::api_get_group,
        groups::api_group_members,
        groups::api_join_group,
        groups::api_group_posts,
        groups::api_create_group_post,
        posts::api_get_post,
        posts::api_update_post,
        posts::api_like_post,
        posts::api_post_comments,
        posts::api_create_comment,
        posts::api_like_comment,
        posts::api_comment_replies,
        posts::api_create_reply,
        posts::api_like_reply,
        reflections::api_create_reflection,
        reflections::api_list_reflections,
        reflections::api_created_reflections,
        reflections::api_get_reflection,
        reflections::api_update_reflection,
        reflections::api_submit_response,
        reflections::api_get_response,
        checkins::api_create_checkin,
        checkins::api_list_checkins,
        tags::api_checkin_tags,
        tags::api_resource_tags,
        resources::api_list_resources,
        resources::api_create_resource,
        resources::api_get_resource,
        resources::api_get_assessment,
        resources::api_submit_assessment,
    ]
}
