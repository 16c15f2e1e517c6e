//! Domain models and API bodies.

pub mod category;
pub mod image;
pub mod order;
pub mod product;
pub mod settings;
pub mod user;

pub use category::{Category, CategoryChanges, CategoryInput, CategoryView};
pub use order::{CheckoutRequest, Customer, OrderItemRow, OrderLineView, OrderRow, OrderView, StatusUpdate};
pub use product::{Product, ProductDraft, ProductIds, ProductInput, ProductView};
pub use settings::{Settings, SettingsUpdate};
pub use user::{ChangePasswordRequest, LoginRequest, LoginResponse, RegisterRequest, User, UserView};
