use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::PgPool;
use std::net::TcpListener;

use crate::configuration::Settings;
use crate::email_client::EmailClient;
use crate::repos::{TokenRepository, UserRepository};
use crate::routes::{
    confirm_password_reset, confirm_verification, get_current_user, health_check,
    issue_access_token, register, request_password_reset, request_verification,
    revoke_access_token, update_current_user,
};

pub fn run(
    listener: TcpListener,
    connection: PgPool,
    settings: Settings,
) -> Result<Server, std::io::Error> {
    let users = web::Data::new(UserRepository::new(connection.clone()));
    let tokens = web::Data::new(TokenRepository::new(connection, settings.tokens));
    let email_client = web::Data::new(settings.email.map(|email| {
        EmailClient::new(email.base_url, email.sender, reqwest::Client::new())
    }));

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            // Shared state
            .app_data(users.clone())
            .app_data(tokens.clone())
            .app_data(email_client.clone())
            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/auth/register", web::post().to(register))
            .route("/auth/token", web::post().to(issue_access_token))
            .route("/auth/revoke", web::post().to(revoke_access_token))
            .route("/auth/reset-password/token", web::post().to(request_password_reset))
            .route("/auth/reset-password", web::post().to(confirm_password_reset))
            .route("/auth/verify/token", web::post().to(request_verification))
            .route("/auth/verify", web::post().to(confirm_verification))
            // Bearer-token routes
            .route("/auth/me", web::get().to(get_current_user))
            .route("/auth/me", web::patch().to(update_current_user))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
