//! Procedure implementations
//!
//! Each procedure parses its own input shape from the raw JSON value and
//! calls into the store. Access control has already run in
//! [`rpc::dispatch`](crate::server::rpc::dispatch).

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use crate::inquiry::{InquiryStatus, NewInquiry};
use crate::review::NewReview;
use crate::search::VendorSearch;
use crate::server::rpc::Reply;
use crate::server::{AppState, Caller};
use crate::session;
use crate::wedding::WeddingUpdate;
use crate::{Error, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitReviewInput {
    vendor_id: i64,
    rating: i64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateInquiryInput {
    vendor_id: i64,
    #[serde(default)]
    wedding_id: Option<i64>,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateStatusInput {
    id: i64,
    status: String,
    #[serde(default)]
    vendor_response: Option<String>,
}

/// Deserialize procedure input; shape mismatches are client errors.
fn parse<T: DeserializeOwned>(input: Value) -> Result<T> {
    serde_json::from_value(input).map_err(|e| Error::Validation(e.to_string()))
}

/// Search input: absent input means "all defaults".
fn parse_search(input: Value) -> Result<VendorSearch> {
    match input {
        Value::Null => Ok(VendorSearch::default()),
        other => parse(other),
    }
}

pub async fn invoke(state: &AppState, caller: &Caller, name: &str, input: Value) -> Result<Reply> {
    match name {
        "auth.me" => Reply::data(&caller.user),
        "auth.logout" => Ok(logout(state, caller)),

        "wedding.getOrCreate" => {
            let user = caller.require_user()?;
            let mut store = state.store().await?;
            Reply::data(&store.get_or_create_wedding(user.id)?)
        }
        "wedding.update" => {
            let user = caller.require_user()?;
            let update: WeddingUpdate = parse(input)?;
            update.validate()?;
            let store = state.store().await?;
            Reply::data(&store.update_wedding(user.id, &update)?)
        }

        "marketplace.searchVendors" => {
            let search = parse_search(input)?;
            search.validate()?;
            let store = state.store().await?;
            Reply::data(&store.search_vendors(&search)?)
        }
        "marketplace.getVendor" => {
            let vendor_id: i64 = parse(input)?;
            let store = state.store().await?;
            Reply::data(&store.get_vendor(vendor_id)?)
        }
        "marketplace.getVendorReviews" => {
            let vendor_id: i64 = parse(input)?;
            let store = state.store().await?;
            Reply::data(&store.get_vendor_reviews(vendor_id)?)
        }
        "marketplace.submitReview" => {
            let user = caller.require_user()?;
            let input: SubmitReviewInput = parse(input)?;
            let review = NewReview {
                vendor_id: input.vendor_id,
                user_id: user.id,
                rating: input.rating,
                title: input.title,
                content: input.content,
            };
            review.validate()?;
            let mut store = state.store().await?;
            Reply::data(&store.create_review(&review)?)
        }
        "marketplace.saveVendor" => {
            let user = caller.require_user()?;
            let vendor_id: i64 = parse(input)?;
            let mut store = state.store().await?;
            Reply::data(&store.save_vendor(user.id, vendor_id)?)
        }
        "marketplace.unsaveVendor" => {
            let user = caller.require_user()?;
            let vendor_id: i64 = parse(input)?;
            let store = state.store().await?;
            store.unsave_vendor(user.id, vendor_id)?;
            Reply::data(&true)
        }
        "marketplace.getSavedVendors" => {
            let user = caller.require_user()?;
            let store = state.store().await?;
            Reply::data(&store.get_saved_vendors(user.id)?)
        }

        "inquiries.create" => {
            let user = caller.require_user()?;
            let input: CreateInquiryInput = parse(input)?;
            let inquiry = NewInquiry {
                vendor_id: input.vendor_id,
                user_id: user.id,
                wedding_id: input.wedding_id,
                message: input.message,
            };
            let store = state.store().await?;
            Reply::data(&store.create_inquiry(&inquiry)?)
        }
        "inquiries.getMyInquiries" => {
            let user = caller.require_user()?;
            let store = state.store().await?;
            Reply::data(&store.get_user_inquiries(user.id)?)
        }
        "inquiries.updateStatus" => {
            caller.require_user()?;
            let input: UpdateStatusInput = parse(input)?;
            let status: InquiryStatus = input.status.parse()?;
            let mut store = state.store().await?;
            let updated =
                store.update_inquiry_status(input.id, status, input.vendor_response.as_deref())?;
            Reply::data(&updated)
        }

        other => Err(Error::NotFound(format!("procedure {}", other))),
    }
}

fn logout(state: &AppState, caller: &Caller) -> Reply {
    Reply {
        data: serde_json::json!({ "success": true }),
        set_cookie: Some(session::cleared_cookie(&state.cookie_name, caller.secure)),
    }
}
