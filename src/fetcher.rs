use crate::collection::{parse_page, RunPage};
use crate::error::FetchError;
use crate::events::AppEvent;
use crate::grid::FetchTicket;
use crate::loading::LoadingCounter;
use crate::page::Query;
use crate::plot::{parse_plot, PlotRequest, PlotSummary};
use crate::source::RunSource;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;

pub async fn fetch_page(source: &dyn RunSource, query: &Query) -> Result<RunPage, FetchError> {
    let body = source.list_runs(query).await?;
    parse_page(&body)
}

pub async fn fetch_plot(
    source: &dyn RunSource,
    request: &PlotRequest,
) -> Result<PlotSummary, FetchError> {
    let body = source.plot_metrics(request).await?;
    parse_plot(&body)
}

/// Runs one list request in the background and reports it tagged with the
/// ticket's generation. The loading counter covers the whole request.
pub fn spawn_fetch(
    source: Arc<dyn RunSource>,
    ticket: FetchTicket,
    loading: &LoadingCounter,
    tx: mpsc::UnboundedSender<AppEvent>,
) {
    let guard = loading.guard();
    let report = tx.clone();
    spawn_monitored(tx, "page fetch", async move {
        let _guard = guard;
        let result = fetch_page(source.as_ref(), &ticket.query).await;
        send(
            &report,
            AppEvent::PageLoaded {
                generation: ticket.generation,
                result,
            },
        );
    });
}

pub fn spawn_plot(
    source: Arc<dyn RunSource>,
    request: PlotRequest,
    loading: &LoadingCounter,
    tx: mpsc::UnboundedSender<AppEvent>,
) {
    let guard = loading.guard();
    let report = tx.clone();
    spawn_monitored(tx, "plot request", async move {
        let _guard = guard;
        let result = fetch_plot(source.as_ref(), &request).await;
        send(&report, AppEvent::PlotLoaded(result));
    });
}

/// Spawns `fut` and turns a panic inside it into an [`AppEvent::Error`].
pub fn spawn_monitored(
    tx: mpsc::UnboundedSender<AppEvent>,
    label: &'static str,
    fut: impl Future<Output = ()> + Send + 'static,
) {
    tokio::spawn(async move {
        let handle = tokio::spawn(fut);
        if let Err(join_err) = handle.await {
            let msg = if join_err.is_panic() {
                match join_err.into_panic().downcast::<String>() {
                    Ok(s) => *s,
                    Err(payload) => match payload.downcast::<&str>() {
                        Ok(s) => s.to_string(),
                        Err(_) => "unknown panic".to_string(),
                    },
                }
            } else {
                "task cancelled".to_string()
            };
            tracing::error!("{label} panicked: {msg}");
            send(&tx, AppEvent::Error(format!("{label} crashed: {msg}")));
        }
    });
}

fn send(tx: &mpsc::UnboundedSender<AppEvent>, event: AppEvent) {
    if tx.send(event).is_err() {
        tracing::warn!("event channel closed; dropping result");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::page::PageState;
    use async_trait::async_trait;

    struct Fixed(&'static str);

    #[async_trait]
    impl RunSource for Fixed {
        async fn list_runs(&self, _query: &Query) -> Result<String, FetchError> {
            Ok(self.0.to_string())
        }

        async fn plot_metrics(&self, _request: &PlotRequest) -> Result<String, FetchError> {
            Ok(self.0.to_string())
        }
    }

    struct Panics;

    #[async_trait]
    impl RunSource for Panics {
        async fn list_runs(&self, _query: &Query) -> Result<String, FetchError> {
            panic!("boom")
        }

        async fn plot_metrics(&self, _request: &PlotRequest) -> Result<String, FetchError> {
            panic!("boom")
        }
    }

    fn ticket(generation: u64) -> FetchTicket {
        FetchTicket {
            generation,
            query: PageState::new(12).query(),
        }
    }

    #[tokio::test]
    async fn reports_generation_and_releases_loading() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let loading = LoadingCounter::new();
        spawn_fetch(
            Arc::new(Fixed(r#"{"data":[{"id":"r1"}],"total":1}"#)),
            ticket(7),
            &loading,
            tx,
        );
        assert!(loading.is_loading());
        match rx.recv().await {
            Some(AppEvent::PageLoaded { generation, result }) => {
                assert_eq!(generation, 7);
                assert_eq!(result.unwrap().data[0].id, "r1");
            }
            other => panic!("unexpected event: {other:?}"),
        }
        loading.on_idle().await;
    }

    #[tokio::test]
    async fn malformed_body_is_reported_not_dropped() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn_fetch(Arc::new(Fixed("{}")), ticket(1), &LoadingCounter::new(), tx);
        match rx.recv().await {
            Some(AppEvent::PageLoaded { result: Err(e), .. }) => {
                assert_eq!(e.kind(), FailureKind::MalformedResponse);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn panicking_source_becomes_error_event() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let loading = LoadingCounter::new();
        spawn_fetch(Arc::new(Panics), ticket(1), &loading, tx);
        match rx.recv().await {
            Some(AppEvent::Error(msg)) => assert!(msg.contains("page fetch crashed: boom")),
            other => panic!("unexpected event: {other:?}"),
        }
        loading.on_idle().await;
    }

    #[tokio::test]
    async fn plot_summary_is_delivered() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let request = PlotRequest {
            runs: vec!["a".to_string()],
            multi: false,
            since: None,
            end: None,
        };
        spawn_plot(
            Arc::new(Fixed(r#"[{"name":"acc","y":[1,2]}]"#)),
            request,
            &LoadingCounter::new(),
            tx,
        );
        match rx.recv().await {
            Some(AppEvent::PlotLoaded(Ok(summary))) => assert_eq!(summary.traces[0].points, 2),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
