//! Creator earnings, by calendar month.
//!
//! The upstream aggregates each month's earnings for a while after it ends
//! and answers 409 until the aggregation is final. "Current" earnings
//! therefore means the newest month that is already available.

use tracing::instrument;

use super::Session;
use crate::error::Result;
use crate::pagination::{OffsetQuery, PageResult, fetch_offset};
use crate::period::{EarningsPeriod, validate_history_period};
use crate::pipeline::{RequestSpec, STATUS_OK, StatusCheck};
use crate::types::{Earnings, EarningsList};

/// `meta.status` reported while a month is still being aggregated.
pub const STATUS_AGGREGATING: u16 = 409;

fn monthly_incomes(session: &Session, period: EarningsPeriod) -> Result<RequestSpec> {
    Ok(RequestSpec::get(format!(
        "{}/v1/my/cpp/monthly-incomes",
        session.endpoints.commons
    ))?
    .query("year", period.year())
    .query("month", period.month()))
}

fn monthly_income_history(session: &Session, period: EarningsPeriod) -> Result<RequestSpec> {
    Ok(RequestSpec::get(format!(
        "{}/v1/my/cpp/monthly-income-histories",
        session.endpoints.commons
    ))?
    .query("yearMonth", period.compact()))
}

/// Decides which month "current earnings" refers to.
///
/// Probes the current month with a one-item request. A 409 falls back one
/// month; any other status is taken as available. Every call probes again.
pub struct EarningsPeriodResolver<'a> {
    session: &'a Session,
}

impl<'a> EarningsPeriodResolver<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn resolve(&self) -> Result<EarningsPeriod> {
        let current = EarningsPeriod::containing(self.session.clock.today());
        let probe = monthly_incomes(self.session, current)?
            .query("offset", 0)
            .query("limit", 1);

        let envelope = self
            .session
            .pipeline
            .execute::<serde_json::Value>(&probe, &self.session.credential, StatusCheck::Skip)
            .await?;

        let resolved = match envelope.meta.status {
            STATUS_OK => current,
            STATUS_AGGREGATING => {
                tracing::debug!(%current, "current month still aggregating, using previous");
                current.previous()
            }
            status => {
                tracing::warn!(
                    status,
                    %current,
                    "unexpected probe status, assuming current month is available"
                );
                current
            }
        };

        Ok(resolved)
    }
}

/// Monthly earnings endpoints.
pub struct EarningsApi<'a> {
    session: &'a Session,
}

impl<'a> EarningsApi<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    pub fn resolver(&self) -> EarningsPeriodResolver<'a> {
        EarningsPeriodResolver::new(self.session)
    }

    /// Earnings for the newest available month.
    pub async fn current(&self, query: OffsetQuery) -> Result<Earnings> {
        let period = self.resolver().resolve().await?;
        self.for_period(period, query).await
    }

    /// Earnings for an explicit month, without probing.
    #[instrument(skip(self, period), fields(%period), level = "debug")]
    pub async fn for_period(&self, period: EarningsPeriod, query: OffsetQuery) -> Result<Earnings> {
        let spec = monthly_incomes(self.session, period)?;
        self.fetch(spec, period, query).await
    }

    /// Finalized earnings history for a `YYYYMM` month.
    ///
    /// The month must be at least two months old; the check runs before any
    /// request is made.
    #[instrument(skip(self), level = "debug")]
    pub async fn history(&self, year_month: &str, query: OffsetQuery) -> Result<Earnings> {
        let period = validate_history_period(year_month, self.session.clock.today())?;
        let spec = monthly_income_history(self.session, period)?;
        self.fetch(spec, period, query).await
    }

    async fn fetch(
        &self,
        spec: RequestSpec,
        period: EarningsPeriod,
        query: OffsetQuery,
    ) -> Result<Earnings> {
        let mut total_amount = None;
        let page: PageResult<_> = fetch_offset(
            &self.session.pipeline,
            &self.session.credential,
            spec,
            query,
            |data: EarningsList| {
                total_amount = data.total_amount;
                (data.items, data.total_count)
            },
        )
        .await?;

        Ok(Earnings {
            period,
            total_amount,
            page,
        })
    }
}
