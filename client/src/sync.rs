//! Non-streaming fallback: one request, one whole-result response.

use crate::client::CompileClient;
use crate::error::ClientError;
use crate::request::{CompileRequest, CompileResult};

impl CompileClient {
    /// Compile `request` against the sync endpoint.
    ///
    /// Atomic from the caller's perspective: a [`CompileResult`] comes back
    /// only on a success status, and there are no partial results. Non-2xx
    /// responses fail with [`ClientError::Server`] carrying the backend's
    /// `message` when the body had one; transport failures fail with
    /// [`ClientError::Transport`]. Unlike the streaming path, `json_output`
    /// is honored here.
    pub async fn compile_sync(&self, request: &CompileRequest) -> crate::Result<CompileResult> {
        let response = self
            .http()
            .post(self.config().compile_sync_url())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_failure(status, &body));
        }

        Ok(response.json::<CompileResult>().await?)
    }
}
