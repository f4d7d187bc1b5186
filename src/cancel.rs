//! 요청 취소 토큰
//!
//! 화면을 벗어나면 진행 중인 요청을 취소하여 busy 상태가 남지 않도록 합니다.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// 취소될 때까지 대기
    pub async fn cancelled(&self) {
        // 플래그 확인 전에 대기자를 먼저 등록해야 알림을 놓치지 않음
        let notified = self.inner.notify.notified();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }

    /// 작업과 취소 중 먼저 끝나는 쪽을 반환
    pub async fn run<T, F>(&self, fut: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(AppError::Cancelled),
            result = fut => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn completes_when_not_cancelled() {
        let token = CancelToken::new();
        let result = token.run(async { Ok::<_, AppError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn already_cancelled_short_circuits() {
        let token = CancelToken::new();
        token.cancel();
        let result = token
            .run(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok::<_, AppError>(())
            })
            .await;
        assert!(matches!(result, Err(AppError::Cancelled)));
    }

    #[tokio::test]
    async fn cancel_interrupts_pending_work() {
        let token = CancelToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let result = token
            .run(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok::<_, AppError>(())
            })
            .await;
        assert!(matches!(result, Err(AppError::Cancelled)));
        assert!(token.is_cancelled());
    }
}
