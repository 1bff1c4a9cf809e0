//! # ZoneMgr Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use super::{
    approach::ApproachParams, drop::DropParams, pick::PickParams, search::SearchParams,
    transit::TransitParams,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZoneMgrParams {
    pub search: SearchParams,

    pub approach: ApproachParams,

    pub pick: PickParams,

    pub transit: TransitParams,

    pub drop: DropParams,

    pub quota: QuotaParams,
}

/// Number of victims of each kind which must be deposited before the zone is exited.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct QuotaParams {
    pub silver: u32,
    pub black: u32,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for QuotaParams {
    fn default() -> Self {
        Self {
            silver: 2,
            black: 1,
        }
    }
}
