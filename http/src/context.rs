use std::{
    cmp::min,
    sync::{
        atomic::{AtomicBool, Ordering::Relaxed},
        Arc,
    },
    thread::sleep,
    time::{Duration, Instant},
};

const SLEEP_SLICE: Duration = Duration::from_millis(10);

/// 请求上下文
///
/// 用于在一次逻辑操作（例如一次文件上传）的多个 HTTP 请求之间传递取消信号和截止时间。
/// 克隆得到的上下文共享同一个取消信号，而 [`Context::child`] 得到的子上下文可以独立取消，
/// 同时也能观察到父上下文的取消。
#[derive(Debug, Clone, Default)]
pub struct Context {
    inner: Arc<ContextInner>,
}

#[derive(Debug, Default)]
struct ContextInner {
    cancelled: AtomicBool,
    deadline: Option<Instant>,
    parent: Option<Context>,
}

impl Context {
    /// 创建一个永不超时的上下文
    #[inline]
    pub fn background() -> Self {
        Default::default()
    }

    /// 创建子上下文
    #[inline]
    pub fn child(&self) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                cancelled: AtomicBool::new(false),
                deadline: None,
                parent: Some(self.to_owned()),
            }),
        }
    }

    /// 创建带有超时时长的子上下文
    #[inline]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                cancelled: AtomicBool::new(false),
                deadline: Some(Instant::now() + timeout),
                parent: Some(self.to_owned()),
            }),
        }
    }

    /// 取消上下文，所有共享该上下文的请求和它的子上下文都能观察到
    #[inline]
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Relaxed);
    }

    /// 上下文是否已经被取消或超时
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Relaxed)
            || self.inner.deadline.map_or(false, |deadline| Instant::now() >= deadline)
            || self.inner.parent.as_ref().map_or(false, |parent| parent.is_cancelled())
    }

    /// 睡眠指定时长，期间如果上下文被取消则立即返回
    ///
    /// 返回 `true` 表示完整地睡眠了指定时长
    pub fn sleep(&self, duration: Duration) -> bool {
        let until = Instant::now() + duration;
        loop {
            if self.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= until {
                return true;
            }
            sleep(min(until - now, SLEEP_SLICE));
        }
    }
}
