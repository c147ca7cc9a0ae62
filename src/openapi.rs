use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        version = "0.1.0",
        description = r#"
# Storefront Checkout & Order API

Backend for a UPI-first e-commerce storefront.

## Features

- **Checkout sessions**: short-lived UPI payment sessions with QR deep
  links, rotated when their display window lapses
- **Pending payments**: durable, recoverable records of unconfirmed UPI
  checkout attempts (24h lifetime, lazy expiry)
- **Orders**: cash-on-delivery and UPI order creation with denormalized
  line items
- **Recovery**: promotion of a pending payment into a confirmed order
  from its session id

## Error Handling

Failures return a consistent JSON body with the HTTP status category, a
human-readable message, and a timestamp.
"#
    ),
    paths(
        crate::handlers::checkout::start_checkout,
        crate::handlers::checkout::rotate_session,
        crate::handlers::checkout::resume_checkout,
        crate::handlers::checkout::decline_resume,
        crate::handlers::checkout::submit_order,
        crate::handlers::recovery::verify_payment,
        crate::handlers::orders::get_order,
        crate::handlers::orders::list_orders,
    ),
    components(schemas(
        crate::entities::order::PaymentMethod,
        crate::checkout::CartLine,
        crate::checkout::ShippingDetails,
        crate::checkout::OrderDraft,
        crate::checkout::mirror::CheckoutMirror,
        crate::handlers::checkout::StartCheckoutRequest,
        crate::handlers::checkout::RotateSessionRequest,
        crate::handlers::checkout::SubmitOrderRequest,
        crate::handlers::checkout::CheckoutSessionResponse,
        crate::handlers::recovery::RecoverPaymentRequest,
        crate::services::orders::OrderResponse,
        crate::services::orders::OrderItemResponse,
        crate::services::orders::OrderDetailResponse,
        crate::services::orders::OrderListResponse,
        crate::errors::ErrorResponse,
    )),
    tags(
        (name = "Checkout", description = "UPI checkout sessions and order submission"),
        (name = "Recovery", description = "Pending payment recovery"),
        (name = "Orders", description = "Order readback")
    )
)]
pub struct ApiDoc;

/// Swagger UI mounted at /docs, serving the generated document
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
