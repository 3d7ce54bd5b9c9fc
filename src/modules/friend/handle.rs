use actix_web::{get, post, web, HttpRequest};
use uuid::Uuid;

use crate::{
    api::{error, success},
    middlewares::get_claims,
    modules::{
        friend::{
            model::{
                FriendProfile, FriendRequestBody, FriendRequestResponse, FriendshipResponse,
                RespondAction, SendOutcome,
            },
            repository_pg::FriendRepositoryPg,
            schema::FriendRequestEntity,
            service::FriendService,
        },
        user::repository_pg::UserRepositoryPg,
    },
    utils::ValidatedJson,
};

pub type FriendSvc = FriendService<FriendRepositoryPg, UserRepositoryPg>;

#[post("/requests")]
pub async fn send_friend_request(
    friend_service: web::Data<FriendSvc>,
    body: ValidatedJson<FriendRequestBody>,
    req: HttpRequest,
) -> Result<success::Success<FriendRequestEntity>, error::Error> {
    let sender_id = get_claims(&req)?.sub;
    let outcome = friend_service.send_friend_request(sender_id, body.0.recipient_id).await?;

    let response = match outcome {
        SendOutcome::Sent(request) => success::Success::created(Some(request))
            .message("Friend request sent successfully"),
        SendOutcome::AutoAccepted(request) => success::Success::created(Some(request))
            .message("Friend request accepted automatically as they had already requested you"),
    };
    Ok(response)
}

#[post("/requests/{request_id}/{action}")]
pub async fn respond_to_friend_request(
    friend_service: web::Data<FriendSvc>,
    path: web::Path<(Uuid, String)>,
    req: HttpRequest,
) -> Result<success::Success<FriendRequestEntity>, error::Error> {
    let responder_id = get_claims(&req)?.sub;
    let (request_id, action) = path.into_inner();
    let action: RespondAction = action.parse().map_err(error::Error::from)?;

    let request = friend_service.respond_to_request(responder_id, request_id, action).await?;

    let message = match action {
        RespondAction::Accept => "Friend request accepted successfully",
        RespondAction::Reject => "Friend request rejected successfully",
    };
    Ok(success::Success::ok(Some(request)).message(message))
}

#[get("/requests")]
pub async fn list_friend_requests(
    friend_service: web::Data<FriendSvc>,
    req: HttpRequest,
) -> Result<success::Success<Vec<FriendRequestResponse>>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let requests = friend_service.get_friend_requests(user_id).await?;

    Ok(success::Success::ok(Some(requests)).message("Friend requests retrieved successfully"))
}

#[get("/suggestions")]
pub async fn friend_suggestions(
    friend_service: web::Data<FriendSvc>,
    req: HttpRequest,
) -> Result<success::Success<Vec<FriendProfile>>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let suggestions = friend_service.suggest_friends(user_id).await?;

    Ok(success::Success::ok(Some(suggestions)).message("Suggestions retrieved successfully"))
}

#[get("/")]
pub async fn list_friends(
    friend_service: web::Data<FriendSvc>,
    req: HttpRequest,
) -> Result<success::Success<Vec<FriendshipResponse>>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let friends = friend_service.get_friends(user_id).await?;

    Ok(success::Success::ok(Some(friends)).message("Friends retrieved successfully"))
}
