use super::{ExecutionContext, Executor, Strategy};
use crate::cache::PartitionName;
use crate::telemetry::CacheEvent;
use crate::types::{Request, Response};
use crate::Result;
use async_trait::async_trait;

/// Serve from the partition when present; otherwise fetch, store a 2xx copy and return.
/// Network errors on a miss are propagated.
pub struct CacheFirst;

#[async_trait]
impl Executor for CacheFirst {
    fn strategy(&self) -> Strategy {
        Strategy::CacheFirst
    }

    async fn execute(
        &self,
        ctx: &ExecutionContext,
        request: &Request,
        partition: &PartitionName,
    ) -> Result<Response> {
        let url = request.url().to_string();
        if let Some(entry) = ctx.registry.match_request(partition, request).await? {
            ctx.emit(CacheEvent::Hit {
                partition: partition.to_string(),
                url,
            })
            .await;
            return Ok(entry.response);
        }
        ctx.emit(CacheEvent::Miss {
            partition: partition.to_string(),
            url,
        })
        .await;

        let response = ctx.fetcher.fetch(request).await?;
        ctx.store(partition, request, &response).await;
        Ok(response)
    }
}
