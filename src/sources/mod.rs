//! Raw event sources.

pub mod keycloak;
