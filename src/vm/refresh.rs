//! 自动刷新节拍：由宿主事件循环传入当前时间轮询，不自带线程

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct RefreshTimer {
    interval: Duration,
    due_at: Option<Instant>,
}

impl RefreshTimer {
    pub fn new(interval: Duration) -> Self {
        Self { interval, due_at: None }
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
        self.due_at = None;
    }

    /// 到期返回 true 并排定下一次；首次调用只启动计时
    ///
    /// 事件循环停顿超过多个周期时只触发一次，不补发。
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.due_at {
            None => {
                self.due_at = Some(now + self.interval);
                false
            }
            Some(due) if now >= due => {
                self.due_at = Some(now + self.interval);
                true
            }
            Some(_) => false,
        }
    }
}
