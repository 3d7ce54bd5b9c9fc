use crate::modules::friend::handle::*;
use actix_web::web::{scope, ServiceConfig};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/friends")
            .service(send_friend_request)
            .service(list_friend_requests)
            .service(respond_to_friend_request)
            .service(friend_suggestions)
            .service(list_friends),
    );
}
