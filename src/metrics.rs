//! Prometheus metrics for the feed pipeline.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, Encoder, IntCounter,
    IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    pub static ref FEED_SNAPSHOTS_TOTAL: IntCounter = register_int_counter!(
        "feed_snapshots_total",
        "Snapshots applied by the live feed view"
    )
    .expect("register feed_snapshots_total");

    pub static ref FEED_POSTS: IntGauge = register_int_gauge!(
        "feed_posts",
        "Posts in the most recently applied snapshot"
    )
    .expect("register feed_posts");

    pub static ref MUTATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "feed_mutations_total",
        "Feed mutations issued against the document store",
        &["operation", "outcome"]
    )
    .expect("register feed_mutations_total");

    pub static ref UPLOAD_BYTES_TOTAL: IntCounter = register_int_counter!(
        "upload_bytes_total",
        "Media bytes accepted for upload"
    )
    .expect("register upload_bytes_total");
}

/// Render all registered metrics in the Prometheus text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %err, "failed to encode metrics");
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn metrics_endpoint_renders_registered_collectors() {
        MUTATIONS_TOTAL.with_label_values(&["like", "ok"]).inc();

        let response = serve_metrics().await;
        assert_eq!(response.status(), actix_web::http::StatusCode::OK);
    }
}
