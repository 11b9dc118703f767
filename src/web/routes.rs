// src/web/routes.rs

use actix_web::web;

// Liveness probe. Deliberately does not touch the database so that a
// saturated pool cannot take the health endpoint down with it.
async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

// Called in `main.rs` to configure services for the Actix App.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api")
      // Health Check Route
      .route("/health", web::get().to(health_check_handler))
      // Checkout Routes
      .service(web::scope("/checkout").route(
        "/create-session",
        web::post().to(crate::web::handlers::checkout_handlers::create_session_handler),
      ))
      // Webhook Routes
      // MercadoPago pushes POST notifications with a JSON body; the GET
      // form is the legacy query-parameter delivery and stays supported.
      .service(
        web::scope("/mp")
          .route(
            "/webhook",
            web::post().to(crate::web::handlers::webhook_handlers::mp_webhook_post_handler),
          )
          .route(
            "/webhook",
            web::get().to(crate::web::handlers::webhook_handlers::mp_webhook_get_handler),
          ),
      )
      // Catalog Routes
      .service(
        web::scope("/products")
          .route(
            "",
            web::get().to(crate::web::handlers::product_handlers::list_variants_handler),
          )
          .route(
            "/{variant_id}",
            web::get().to(crate::web::handlers::product_handlers::get_variant_handler),
          ),
      )
      // Order Routes
      .service(web::scope("/orders").route(
        "/{order_id}",
        web::get().to(crate::web::handlers::order_handlers::get_order_handler),
      )),
  );
}
