// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    common::error::AppError,
    middleware::auth::CurrentUser,
    models::user::Capability,
};

/// Type-level name for a capability, so handlers can declare what they
/// need in their signature.
pub trait CapabilityDef: Send + Sync + 'static {
    fn capability() -> Capability;
}

/// Guard extractor. Rejects with 401 when no user is attached and 403 when
/// the user's role lacks `T`'s capability.
pub struct RequireCapability<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireCapability<T>
where
    T: CapabilityDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<CurrentUser>()
            .ok_or(AppError::InvalidToken)?;

        let required = T::capability();
        if !user.role.can(required) {
            tracing::warn!(user_id = %user.id, capability = required.as_str(), "capability denied");
            return Err(AppError::Forbidden(required));
        }

        Ok(RequireCapability(PhantomData))
    }
}

// ---
// CAPABILITIES
// ---

macro_rules! capability {
    ($name:ident => $cap:ident) => {
        pub struct $name;
        impl CapabilityDef for $name {
            fn capability() -> Capability {
                Capability::$cap
            }
        }
    };
}

capability!(CapViewDashboard => ViewDashboard);
capability!(CapReadUsers => ReadUsers);
capability!(CapReadInventory => ReadInventory);
capability!(CapWriteInventory => WriteInventory);
capability!(CapReadLeads => ReadLeads);
capability!(CapWriteLeads => WriteLeads);
capability!(CapReadCustomers => ReadCustomers);
capability!(CapWriteCustomers => WriteCustomers);
capability!(CapReadBookings => ReadBookings);
capability!(CapWriteBookings => WriteBookings);
capability!(CapReadPayments => ReadPayments);
capability!(CapWritePayments => WritePayments);
capability!(CapManagePartners => ManagePartners);
