// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Session tokens and role-based authorization for the clinic API.
//!
//! ## Auth Flow
//!
//! 1. A staff member logs in with username and password
//! 2. The server verifies the Argon2 hash and returns an HS256 JWT carrying
//!    `sub` (account id), `role` and `exp` (24 hours out)
//! 3. Later requests send `Authorization: Bearer <token>`
//! 4. Account routes verify signature, issuer and expiry through the [`Auth`]
//!    extractor
//! 5. Patient routes pass the [`BearerToken`] and the route's [`Action`] to
//!    [`AuthorizationGate::admit`] before reading the body; the patient
//!    service checks the role again before touching the store
//!
//! ## Security
//!
//! - Tokens are stateless; nothing is stored per session
//! - No clock skew leeway: a token is refused from its `exp` second onward
//! - Passwords, hashes and tokens are never logged

pub mod claims;
pub mod error;
pub mod extractor;
pub mod gate;
pub mod password;
pub mod permissions;
pub mod roles;
pub mod token;

pub use claims::{AuthenticatedUser, TokenClaims};
pub use error::AuthError;
pub use extractor::{Auth, BearerToken};
pub use gate::AuthorizationGate;
pub use password::{HashingError, PasswordHasher};
pub use permissions::{Action, AuthzError, PermissionTable};
pub use roles::Role;
pub use token::{IssuedToken, TokenIssuer};
