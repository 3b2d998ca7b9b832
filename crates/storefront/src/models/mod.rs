//! Per-visitor view state kept in the session or in cookies.

pub mod bag;
pub mod menu;
pub mod session;
pub mod wishlist;

pub use bag::{Bag, BagLine, MAX_LINE_QUANTITY, ResolvedBag, ResolvedLine};
pub use menu::{HIDDEN_MENU_COOKIE, MenuLabel, MenuVisibility};
pub use session::{CurrentUser, keys as session_keys};
pub use wishlist::Wishlist;
