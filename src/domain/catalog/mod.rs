//! Category catalog and directory users.
//!
//! Both are owned by external collaborators; the workflow only reads them
//! (apart from lazily creating the uncategorized bucket).

mod category;
mod display;
mod user;

pub use category::{
    active_leaves, default_tree, find_domain_by_name, Category, DOMAIN_LEVEL, LEAF_LEVEL,
    UNCATEGORIZED_ABBREVIATION, UNCATEGORIZED_NAME,
};
pub use display::{display_for, icon_for, label_for, CategoryDisplay, DEFAULT_CATEGORY_ICON};
pub use user::User;
