use crate::base::neterror::NetError;
use crate::cookies::jar::parse_set_cookies;
use crate::hooks;
use crate::http::body::{self, PayloadSource};
use crate::http::redirect;
use crate::http::response::{RequestInfo, Response};
use crate::http::retry::{self, RetryDecision};
use crate::options::Options;
use tokio::time::{sleep, timeout};

/// Drives one logical call: attempts, retries and redirects over a single
/// exclusively owned [`Options`] record.
pub struct RequestJob {
    options: Options,
    payload: PayloadSource,
}

impl RequestJob {
    /// Start a new call. Retry and redirect bookkeeping starts from zero.
    pub fn new(mut options: Options) -> Self {
        options.reset_counters();
        Self {
            options,
            payload: PayloadSource::default(),
        }
    }

    /// The live record.
    pub fn options(&self) -> &Options {
        &self.options
    }

    pub async fn run(mut self) -> Result<Response, NetError> {
        body::resolve(&mut self.options)?;
        hooks::run_init(&mut self.options);
        self.payload = PayloadSource::capture(&self.options);

        loop {
            self.payload.restore(&mut self.options);
            body::resolve(&mut self.options)?;

            self.options.full_url = Some(self.options.compute_full_url()?);
            hooks::run_before_request(&mut self.options);
            let url = self.options.compute_full_url()?;
            self.options.full_url = Some(url.clone());

            let method = self.options.current_method();
            let adapter = self.options.adapter.clone().ok_or(NetError::MissingAdapter)?;
            let attempt_timeout = self.options.request_timeout();

            tracing::debug!(
                method = %method,
                url = %url,
                retries = self.options.retry_count(),
                redirects = self.options.redirect_urls().len(),
                "dispatching attempt"
            );

            let outcome = timeout(attempt_timeout, adapter.do_request(&self.options))
                .await
                .unwrap_or(Err(NetError::Timeout(attempt_timeout)));

            let sent = RequestInfo {
                method: method.clone(),
                url,
                headers: self.options.outgoing_headers(),
                body: self.options.body.as_ref().map(|b| b.to_bytes()),
            };
            body::release(&mut self.options);

            let mut response = match outcome {
                Ok(response) => response,
                Err(err) => match retry::evaluate(&self.options, &method, None, Some(&err)) {
                    RetryDecision::Retry => {
                        self.back_off(None, Some(&err)).await;
                        continue;
                    }
                    RetryDecision::Exhausted => {
                        tracing::warn!(retries = self.options.retry_count(), error = %err, "retries exhausted");
                        return Err(NetError::MaxRetriesExceeded {
                            retries: self.options.retry_count(),
                            last_response: None,
                            last_error: Some(Box::new(err)),
                        });
                    }
                    RetryDecision::Stop => return Err(err),
                },
            };

            response.set_request(sent);
            if let Some(unmarshal) = self.options.unmarshal_json.clone() {
                response.set_unmarshal_json(unmarshal);
            }
            self.store_cookies(&response);

            if let Some(overrides) = hooks::run_after_response(&self.options, &mut response)? {
                if self.options.retry_count() >= self.options.retry_policy().limit {
                    tracing::warn!(retries = self.options.retry_count(), "hook retry over the limit");
                    return Err(self.exhausted(response));
                }
                response.close();
                self.options.merge_from(overrides);
                hooks::run_before_retry(&mut self.options, None);
                self.options.retries += 1;
                continue;
            }

            match retry::evaluate(&self.options, &method, Some(&response), None) {
                RetryDecision::Retry => {
                    self.back_off(Some(&response), None).await;
                    response.close();
                    continue;
                }
                RetryDecision::Exhausted => {
                    tracing::warn!(
                        retries = self.options.retry_count(),
                        status = response.status().as_u16(),
                        "retries exhausted"
                    );
                    return Err(self.exhausted(response));
                }
                RetryDecision::Stop => {}
            }

            if redirect::should_redirect(&self.options, &response) {
                let hop = redirect::follow(&mut self.options, &mut response)?;
                if hop.rewrote_method {
                    self.payload.clear();
                }
                continue;
            }

            return Ok(response);
        }
    }

    /// BeforeRetry hooks, the computed wait, then count the retry.
    async fn back_off(&mut self, response: Option<&Response>, error: Option<&NetError>) {
        hooks::run_before_retry(&mut self.options, error);
        let delay = retry::retry_delay(&self.options, response, error);
        tracing::debug!(
            retries = self.options.retry_count(),
            delay_ms = delay.as_millis() as u64,
            "retrying"
        );
        sleep(delay).await;
        self.options.retries += 1;
    }

    fn exhausted(&self, response: Response) -> NetError {
        NetError::MaxRetriesExceeded {
            retries: self.options.retry_count(),
            last_response: Some(Box::new(response)),
            last_error: None,
        }
    }

    fn store_cookies(&self, response: &Response) {
        let (Some(jar), Some(url)) = (self.options.cookie_jar.as_ref(), self.options.full_url.as_ref())
        else {
            return;
        };
        let cookies = parse_set_cookies(response.headers());
        if !cookies.is_empty() {
            jar.set_cookies(url, cookies);
        }
    }
}
