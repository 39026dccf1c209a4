//! Core types for Thread and Hanger.
//!
//! This module provides type-safe wrappers for the boutique's domain concepts.

pub mod bag;
pub mod catalog;
pub mod email;
pub mod form;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod status;

pub use bag::{Bag, BagEntry, BagError, TempId};
pub use catalog::{Category, Size, SizeSet, SizeSetError};
pub use email::{Email, EmailError};
pub use form::FormError;
pub use id::*;
pub use order::{CustomerDetails, NewOrder, Order};
pub use price::{CURRENCY_LABEL, Price, PriceError};
pub use product::{NewProduct, Product};
pub use status::*;
