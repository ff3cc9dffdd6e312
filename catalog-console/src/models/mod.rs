pub mod image;
pub mod import;
pub mod product;
pub mod stats;
pub mod user;

pub use image::{Image, PresignedUrl};
pub use import::ImportReport;
pub use product::{Page, PageMeta, Product, ProductInput, ProductQuery};
pub use stats::StatsOverview;
pub use user::{CurrentUser, LoginRequest, Role, TokenResponse, User};
