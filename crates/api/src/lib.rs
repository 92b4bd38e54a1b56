//! Harborlight API library.
//!
//! The payment and donation backend behind the Harborlight SPA: Stripe
//! `PaymentIntent` creation, webhook-driven order/donation lifecycle, and
//! session-authenticated admin reads. Exposed as a library so handlers and
//! services can be tested outside the binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod stripe;
