use crate::{
    serialize::{auth::LoginReq, error::AppError},
    services::auth::AuthSrv,
};
use actix_web::{error::JsonPayloadError, web, HttpRequest, HttpResponse};

async fn login(
    auth_srv: web::Data<AuthSrv>,
    req: web::Json<LoginReq>,
) -> Result<HttpResponse, AppError> {
    match auth_srv.login(req.into_inner()) {
        Ok(res) => Ok(HttpResponse::Ok().json(res)),
        Err(err) => Err(err),
    }
}

async fn request_challenge(
    address: web::Path<String>,
    auth_srv: web::Data<AuthSrv>,
) -> Result<HttpResponse, AppError> {
    match auth_srv.get_challenge(&address) {
        Ok(res) => Ok(HttpResponse::Ok().json(res)),
        Err(err) => Err(err),
    }
}

fn json_error(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    log::warn!("Invalid login payload on {}: {}", req.path(), err);
    AppError::invalid_data().into()
}

pub fn route(conf: &mut web::ServiceConfig) {
    conf.service(
        web::scope("/api")
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .route("/web3-login", web::post().to(login))
            .route(
                "/web3-login/challenge/{address}",
                web::get().to(request_challenge),
            ),
    );
}
