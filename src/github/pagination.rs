//! Cursor-following collection of paginated listings.
//!
//! ```
//! use std::num::NonZeroU32;
//!
//! use prledger::github::gateway::ApiResponse;
//! use prledger::github::governor::RateGovernor;
//! use prledger::github::pagination::collect_all_pages;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let governor = RateGovernor::new(NonZeroU32::MAX);
//! let items = collect_all_pages(&governor, |page| async move {
//!     let next = (page < 3).then_some(page + 1);
//!     Ok(ApiResponse::new(vec![page]).with_next_page(next))
//! })
//! .await
//! .expect("every page should load");
//! assert_eq!(items, vec![1, 2, 3]);
//! # }
//! ```

use std::future::Future;

use super::error::IntakeError;
use super::gateway::Page;
use super::governor::RateGovernor;

/// Cursor of the first page.
pub const FIRST_PAGE: u32 = 1;

/// Items gathered before a page request failed.
#[derive(Debug)]
pub struct PartialPages<T> {
    /// Items from every page that loaded.
    pub items: Vec<T>,
    /// The failure that ended collection.
    pub error: IntakeError,
}

/// Calls `fetch_page` through `governor` from the first page onwards,
/// concatenating items until no next-page cursor is reported.
///
/// A cursor that does not advance ends collection, so a misbehaving `Link`
/// header cannot loop forever.
///
/// # Errors
///
/// Returns [`PartialPages`] holding the items gathered so far when any page
/// request fails.
pub async fn collect_all_pages<T, F, Fut>(
    governor: &RateGovernor,
    mut fetch_page: F,
) -> Result<Vec<T>, PartialPages<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page<T>, IntakeError>>,
{
    let mut items = Vec::new();
    let mut cursor = Some(FIRST_PAGE);

    while let Some(page) = cursor {
        match governor.call(|| fetch_page(page)).await {
            Ok(response) => {
                items.extend(response.body);
                cursor = response.next_page.filter(|next| *next > page);
            }
            Err(error) => return Err(PartialPages { items, error }),
        }
    }

    Ok(items)
}
