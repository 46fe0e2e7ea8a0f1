//! 步骤回放控制器
//!
//! 持有一条完整的步骤序列和游标，每次移动后同步回调订阅者。
//! 自动播放是一个 tokio 任务，按固定间隔调用 `next`，走到末尾自行停止。

use crate::error::{Error, Result};
use crate::step::Step;
use crate::types::DEFAULT_TICK_MS;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// 回放配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackConfig {
    /// 自动播放的步进间隔
    pub tick: Duration,
}

impl PlaybackConfig {
    pub fn from_millis(ms: u64) -> Self {
        Self {
            tick: Duration::from_millis(ms),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self::from_millis(DEFAULT_TICK_MS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// 没有载入步骤
    Idle,
    Loaded,
    Paused,
    Playing,
}

/// 订阅者：当前步骤、游标、总步数
pub type Subscriber = Box<dyn FnMut(&Step, usize, usize) + Send>;

struct Inner {
    steps: Vec<Step>,
    cursor: usize,
    state: PlaybackState,
    subscriber: Option<Subscriber>,
    playback: Option<JoinHandle<()>>,
    /// 每次取消播放时递增，过期的 tick 据此丢弃
    generation: u64,
    config: PlaybackConfig,
}

impl Inner {
    fn notify(&mut self) {
        let total = self.steps.len();
        if let (Some(step), Some(subscriber)) = (self.steps.get(self.cursor), self.subscriber.as_mut()) {
            subscriber(step, self.cursor, total);
        }
    }

    fn advance(&mut self) -> bool {
        if self.cursor + 1 < self.steps.len() {
            self.cursor += 1;
            self.notify();
            true
        } else {
            false
        }
    }

    fn cancel(&mut self) {
        self.generation += 1;
        if let Some(handle) = self.playback.take() {
            handle.abort();
        }
    }
}

/// 回放控制器
///
/// 克隆得到的实例共享同一份状态。订阅者在内部锁中被调用，
/// 不能在回调里再操作同一个 `Stepper`。
#[derive(Clone)]
pub struct Stepper {
    inner: Arc<Mutex<Inner>>,
}

impl Stepper {
    pub fn new() -> Self {
        Self::with_config(PlaybackConfig::default())
    }

    pub fn with_config(config: PlaybackConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                steps: Vec::new(),
                cursor: 0,
                state: PlaybackState::Idle,
                subscriber: None,
                playback: None,
                generation: 0,
                config,
            })),
        }
    }

    /// 设置订阅者，替换之前的订阅者
    pub fn subscribe<F>(&self, f: F)
    where
        F: FnMut(&Step, usize, usize) + Send + 'static,
    {
        self.inner.lock().subscriber = Some(Box::new(f));
    }

    /// 载入新序列；总是先取消正在进行的播放
    pub fn load(&self, steps: Vec<Step>) {
        let mut inner = self.inner.lock();
        inner.cancel();
        inner.steps = steps;
        inner.cursor = 0;
        inner.state = if inner.steps.is_empty() {
            PlaybackState::Idle
        } else {
            PlaybackState::Loaded
        };
        debug!(steps = inner.steps.len(), "trace loaded");
        inner.notify();
    }

    /// 前进一步；已在末尾时返回 false
    pub fn next(&self) -> bool {
        self.inner.lock().advance()
    }

    /// 后退一步；已在开头时返回 false
    pub fn prev(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.cursor > 0 {
            inner.cursor -= 1;
            inner.notify();
            true
        } else {
            false
        }
    }

    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.cursor = 0;
        inner.notify();
    }

    /// 跳到指定下标（超出范围时取最后一步）；游标改变时返回 true
    pub fn goto(&self, index: usize) -> bool {
        let mut inner = self.inner.lock();
        if inner.steps.is_empty() {
            return false;
        }
        let target = index.min(inner.steps.len() - 1);
        if target == inner.cursor {
            return false;
        }
        inner.cursor = target;
        inner.notify();
        true
    }

    /// 切换自动播放，返回切换后是否在播放
    ///
    /// 必须在 tokio 运行时内调用。
    pub fn play(&self) -> Result<bool> {
        let mut inner = self.inner.lock();
        if inner.state == PlaybackState::Playing {
            inner.cancel();
            inner.state = PlaybackState::Paused;
            return Ok(false);
        }
        if inner.cursor + 1 >= inner.steps.len() {
            return Ok(false);
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::PlaybackError(e.to_string()))?;
        inner.cancel();
        let generation = inner.generation;
        let tick = inner.config.tick;
        let weak = Arc::downgrade(&self.inner);
        inner.playback = Some(runtime.spawn(tick_loop(weak, generation, tick)));
        inner.state = PlaybackState::Playing;
        debug!(cursor = inner.cursor, tick_ms = tick.as_millis() as u64, "playback started");
        Ok(true)
    }

    /// 停止自动播放
    pub fn pause(&self) {
        let mut inner = self.inner.lock();
        if inner.state == PlaybackState::Playing {
            inner.cancel();
            inner.state = PlaybackState::Paused;
        }
    }

    /// 当前步骤的副本
    pub fn current(&self) -> Option<Step> {
        let inner = self.inner.lock();
        inner.steps.get(inner.cursor).cloned()
    }

    pub fn cursor(&self) -> usize {
        self.inner.lock().cursor
    }

    pub fn len(&self) -> usize {
        self.inner.lock().steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().steps.is_empty()
    }

    pub fn state(&self) -> PlaybackState {
        self.inner.lock().state
    }

    /// 整个序列的副本
    pub fn steps(&self) -> Vec<Step> {
        self.inner.lock().steps.clone()
    }
}

impl Default for Stepper {
    fn default() -> Self {
        Self::new()
    }
}

async fn tick_loop(weak: Weak<Mutex<Inner>>, generation: u64, tick: Duration) {
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + tick, tick);
    loop {
        interval.tick().await;
        let Some(shared) = weak.upgrade() else {
            return;
        };
        let mut inner = shared.lock();
        if inner.generation != generation {
            return;
        }
        if !inner.advance() {
            inner.playback = None;
            inner.state = PlaybackState::Paused;
            debug!(cursor = inner.cursor, "playback reached the last step");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::Phase;

    fn steps(n: usize) -> Vec<Step> {
        (0..n)
            .map(|i| Step::new(Phase::Dequeue, format!("step {}", i)))
            .collect()
    }

    fn recording(stepper: &Stepper) -> Arc<Mutex<Vec<(usize, usize)>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        stepper.subscribe(move |_, i, total| sink.lock().push((i, total)));
        seen
    }

    #[test]
    fn test_load_notifies_first_step() {
        let stepper = Stepper::new();
        let seen = recording(&stepper);
        stepper.load(steps(3));
        assert_eq!(*seen.lock(), vec![(0, 3)]);
        assert_eq!(stepper.state(), PlaybackState::Loaded);
        assert_eq!(stepper.current().unwrap().message, "step 0");
    }

    #[test]
    fn test_load_empty_does_not_notify() {
        let stepper = Stepper::new();
        let seen = recording(&stepper);
        stepper.load(Vec::new());
        assert!(seen.lock().is_empty());
        assert_eq!(stepper.state(), PlaybackState::Idle);
        assert!(stepper.current().is_none());
        assert!(!stepper.next());
        assert!(!stepper.prev());
    }

    #[test]
    fn test_bounds() {
        let stepper = Stepper::new();
        let seen = recording(&stepper);
        stepper.load(steps(3));

        assert!(!stepper.prev());
        assert!(stepper.next());
        assert!(stepper.next());
        assert!(!stepper.next());
        assert_eq!(stepper.cursor(), 2);
        assert!(stepper.prev());
        assert_eq!(stepper.cursor(), 1);

        // 越界移动不通知
        assert_eq!(*seen.lock(), vec![(0, 3), (1, 3), (2, 3), (1, 3)]);
    }

    #[test]
    fn test_overrun_and_prev_after_reset() {
        let stepper = Stepper::new();
        let seen = recording(&stepper);
        stepper.load(steps(4));
        assert_eq!(seen.lock().len(), 1);

        let moves = (0..4 + 5).filter(|_| stepper.next()).count();
        assert_eq!(moves, 3);
        assert_eq!(stepper.cursor(), 3);

        stepper.reset();
        assert!(!stepper.prev());
        assert_eq!(stepper.cursor(), 0);
        assert_eq!(
            *seen.lock(),
            vec![(0, 4), (1, 4), (2, 4), (3, 4), (0, 4)]
        );
    }

    #[test]
    fn test_reset_and_goto() {
        let stepper = Stepper::new();
        let seen = recording(&stepper);
        stepper.load(steps(5));

        assert!(stepper.goto(3));
        assert!(!stepper.goto(3));
        assert!(stepper.goto(99));
        assert_eq!(stepper.cursor(), 4);
        stepper.reset();
        assert_eq!(stepper.cursor(), 0);
        assert_eq!(
            *seen.lock(),
            vec![(0, 5), (3, 5), (4, 5), (0, 5)]
        );
    }

    #[test]
    fn test_play_outside_runtime_is_error() {
        let stepper = Stepper::new();
        stepper.load(steps(2));
        assert!(matches!(stepper.play(), Err(Error::PlaybackError(_))));
        assert_eq!(stepper.state(), PlaybackState::Loaded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_runs_to_end_and_stops() {
        let stepper = Stepper::new();
        let seen = recording(&stepper);
        stepper.load(steps(3));

        assert!(stepper.play().unwrap());
        assert_eq!(stepper.state(), PlaybackState::Playing);

        tokio::time::sleep(Duration::from_millis(950)).await;
        assert_eq!(stepper.cursor(), 1);

        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(stepper.cursor(), 2);
        assert_eq!(stepper.state(), PlaybackState::Paused);
        assert_eq!(*seen.lock(), vec![(0, 3), (1, 3), (2, 3)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_toggles_and_pause() {
        let stepper = Stepper::with_config(PlaybackConfig::from_millis(100));
        stepper.load(steps(10));

        assert!(stepper.play().unwrap());
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(stepper.cursor(), 2);

        assert!(!stepper.play().unwrap());
        assert_eq!(stepper.state(), PlaybackState::Paused);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(stepper.cursor(), 2);

        assert!(stepper.play().unwrap());
        tokio::time::sleep(Duration::from_millis(150)).await;
        stepper.pause();
        assert_eq!(stepper.cursor(), 3);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(stepper.cursor(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_cancels_playback() {
        let stepper = Stepper::with_config(PlaybackConfig::from_millis(100));
        stepper.load(steps(10));
        assert!(stepper.play().unwrap());
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(stepper.cursor(), 1);

        stepper.load(steps(4));
        assert_eq!(stepper.state(), PlaybackState::Loaded);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(stepper.cursor(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_at_last_step_does_nothing() {
        let stepper = Stepper::new();
        stepper.load(steps(2));
        stepper.next();
        assert!(!stepper.play().unwrap());
        assert_eq!(stepper.state(), PlaybackState::Loaded);
    }
}
