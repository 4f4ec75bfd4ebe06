//! Error catalog of the product-catalog REST surface.
//!
//! Every problem document the module emits is built from one of these
//! definitions, so `code` and `type` stay stable for clients.

use catalog_errors::ErrDef;

pub struct ErrorCode;

impl ErrorCode {
    pub const VALIDATION: ErrDef = ErrDef {
        status: 400,
        title: "Validation Failed",
        code: "CATALOG_VALIDATION",
        type_url: "https://errors.catalog.dev/validation",
    };

    pub const PRODUCT_NOT_FOUND: ErrDef = ErrDef {
        status: 404,
        title: "Product Not Found",
        code: "CATALOG_PRODUCT_NOT_FOUND",
        type_url: "https://errors.catalog.dev/product-not-found",
    };

    pub const INTERNAL: ErrDef = ErrDef {
        status: 500,
        title: "Internal Server Error",
        code: "CATALOG_INTERNAL",
        type_url: "https://errors.catalog.dev/internal",
    };

    pub const IMAGE_STORAGE_FAILED: ErrDef = ErrDef {
        status: 502,
        title: "Image Storage Failed",
        code: "CATALOG_IMAGE_STORAGE_FAILED",
        type_url: "https://errors.catalog.dev/image-storage-failed",
    };
}
