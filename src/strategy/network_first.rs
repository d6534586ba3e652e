use super::{ExecutionContext, Executor, Strategy};
use crate::cache::PartitionName;
use crate::telemetry::CacheEvent;
use crate::types::{Request, Response};
use crate::{Error, Result};
use async_trait::async_trait;

/// Try the network; store a 2xx copy. On network failure fall back to any partition in
/// lookup order (static, dynamic, generic), else fail with [`Error::Unavailable`].
pub struct NetworkFirst;

#[async_trait]
impl Executor for NetworkFirst {
    fn strategy(&self) -> Strategy {
        Strategy::NetworkFirst
    }

    async fn execute(
        &self,
        ctx: &ExecutionContext,
        request: &Request,
        partition: &PartitionName,
    ) -> Result<Response> {
        let network_error = match ctx.fetcher.fetch(request).await {
            Ok(response) => {
                ctx.store(partition, request, &response).await;
                return Ok(response);
            }
            Err(e) => e,
        };

        let url = request.url().to_string();
        let order = ctx.partitions.lookup_order();
        if let Some((found_in, entry)) = ctx.registry.match_any(&order, request).await? {
            ctx.emit(CacheEvent::NetworkFallback {
                partition: found_in.to_string(),
                url,
                error: network_error.to_string(),
            })
            .await;
            return Ok(entry.response);
        }

        let reason = format!("network failed and no cached copy: {}", network_error);
        ctx.emit(CacheEvent::Unavailable {
            url: url.clone(),
            reason: reason.clone(),
        })
        .await;
        Err(Error::unavailable(url, reason))
    }
}
