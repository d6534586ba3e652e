use super::{ExecutionContext, Executor, Strategy};
use crate::cache::PartitionName;
use crate::telemetry::CacheEvent;
use crate::types::{Request, Response};
use crate::Result;
use async_trait::async_trait;

/// Serve the cached entry immediately and refresh it in the background; with nothing
/// cached, wait for the network.
///
/// The background refresh is not ordered against other refreshes of the same key: a slow
/// response may overwrite a newer one (last write wins).
pub struct StaleWhileRevalidate;

#[async_trait]
impl Executor for StaleWhileRevalidate {
    fn strategy(&self) -> Strategy {
        Strategy::StaleWhileRevalidate
    }

    async fn execute(
        &self,
        ctx: &ExecutionContext,
        request: &Request,
        partition: &PartitionName,
    ) -> Result<Response> {
        let cached = ctx.registry.match_request(partition, request).await?;

        let Some(entry) = cached else {
            ctx.emit(CacheEvent::Miss {
                partition: partition.to_string(),
                url: request.url().to_string(),
            })
            .await;
            let response = ctx.fetcher.fetch(request).await?;
            ctx.store(partition, request, &response).await;
            return Ok(response);
        };

        ctx.emit(CacheEvent::Hit {
            partition: partition.to_string(),
            url: request.url().to_string(),
        })
        .await;

        let bg_ctx = ctx.clone();
        let bg_request = request.clone();
        let bg_partition = partition.clone();
        ctx.revalidations.spawn(async move {
            revalidate(bg_ctx, bg_request, bg_partition).await;
        });

        Ok(entry.response)
    }
}

/// Background refresh. Every failure ends up in the event sink; nothing is returned.
async fn revalidate(ctx: ExecutionContext, request: Request, partition: PartitionName) {
    let url = request.url().to_string();
    let outcome = match ctx.fetcher.fetch(&request).await {
        Ok(response) => ctx.registry.put(&partition, &request, &response).await,
        Err(e) => Err(e),
    };
    let event = match outcome {
        Ok(stored) => CacheEvent::Revalidated {
            partition: partition.to_string(),
            url,
            stored,
        },
        Err(e) => CacheEvent::RevalidationFailed {
            url,
            error: e.to_string(),
        },
    };
    ctx.emit(event).await;
}
