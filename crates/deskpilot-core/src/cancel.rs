//! 태스크별 협력적 취소 토큰.
//!
//! `tokio::sync::watch` 채널 위에 구현한다. 워커는 외부 호출 경계마다
//! [`CancellationToken::guard`] 또는 [`CancellationToken::checkpoint`]를 거친다.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::error::CoreError;

/// 태스크 하나에 대응하는 취소 신호. 복제본은 같은 신호를 공유한다.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    tx: Arc<watch::Sender<bool>>,
}

impl CancellationToken {
    /// 취소되지 않은 새 토큰
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// 취소 신호 발생. 여러 번 호출해도 안전하다.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// 취소 여부
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// 취소될 때까지 대기
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // Sender는 self가 소유하므로 채널이 닫히지 않는다
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// 취소되었으면 `CoreError::Canceled` 반환
    pub fn checkpoint(&self) -> Result<(), CoreError> {
        if self.is_cancelled() {
            Err(CoreError::Canceled)
        } else {
            Ok(())
        }
    }

    /// 외부 호출을 취소 신호와 경합시킨다.
    ///
    /// 호출 전후로 취소를 확인하며, 호출 도중 취소되면 future를 drop하고
    /// `CoreError::Canceled`를 반환한다. 호출이 실패했더라도 그 사이 취소되었다면
    /// 취소가 우선한다.
    pub async fn guard<F, T>(&self, fut: F) -> Result<T, CoreError>
    where
        F: Future<Output = Result<T, CoreError>>,
    {
        self.checkpoint()?;
        let result = tokio::select! {
            biased;
            _ = self.cancelled() => return Err(CoreError::Canceled),
            result = fut => result,
        };
        self.checkpoint()?;
        result
    }

    /// 취소 가능한 대기
    pub async fn sleep(&self, duration: Duration) -> Result<(), CoreError> {
        self.guard(async {
            tokio::time::sleep(duration).await;
            Ok(())
        })
        .await
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
