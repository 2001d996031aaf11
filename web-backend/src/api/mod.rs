use actix_web::web;

pub mod review;

/// 注册根路径上的提交审查路由
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::post().to(review::process_submission))
        .route("/", web::get().to(review::usage))
        .route("/", web::delete().to(review::clear_session));
}
