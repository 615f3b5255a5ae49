use actix_web::web;

use crate::handlers::contact_me;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/contact")
            .service(contact_me::mount_form)
            .service(contact_me::get_form)
            .service(contact_me::edit_draft)
            .service(contact_me::reset_draft)
            .service(contact_me::submit_form)
            .service(contact_me::validate_form)
    );
}
