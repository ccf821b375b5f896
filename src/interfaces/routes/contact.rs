use actix_web::web;

use crate::{handlers::contact, middlewares::rate_limit::GATED_PATH};

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.route(GATED_PATH, web::route().to(contact::send_contact));
}
