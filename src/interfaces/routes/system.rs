use actix_web::web;

use crate::handlers::{home::home, system::health_check};

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(home);
    cfg.service(health_check);
}
