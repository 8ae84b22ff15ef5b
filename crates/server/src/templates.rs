use std::sync::Arc;

use tera::Tera;
use tracing::error;

pub const STORE_NAME: &str = "Dropshop";

/// Storefront templates, embedded so the binary runs from any working directory.
pub fn load() -> Arc<Tera> {
    let mut tera = Tera::default();
    if let Err(err) = tera.add_raw_templates(vec![
        ("base.html", include_str!("../templates/storefront/base.html")),
        ("card.html", include_str!("../templates/storefront/card.html")),
        ("index.html", include_str!("../templates/storefront/index.html")),
        ("products.html", include_str!("../templates/storefront/products.html")),
        ("product.html", include_str!("../templates/storefront/product.html")),
        ("not_found.html", include_str!("../templates/storefront/not_found.html")),
    ]) {
        error!(event_name = "storefront.templates.invalid", error = ?err, "storefront templates failed to load");
    }
    Arc::new(tera)
}
