//! # deskpilot-app
//!
//! DeskPilot 바이너리 진입점.
//! 설정 로드, DI 와이어링, 태스크 제출, 이벤트 출력, 시그널 기반 종료를 담당한다.

mod lifecycle;
mod settings;
mod wiring;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use deskpilot_core::config_manager::ConfigManager;
use deskpilot_core::models::event::AgentEvent;
use deskpilot_core::models::task::TaskStatus;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::lifecycle::LifecycleManager;
use crate::settings::{CliOverrides, EnvOverrides};
use crate::wiring::build_runtime;

/// DeskPilot: 화면 인식 기반 데스크톱 작업 에이전트
#[derive(Parser, Debug)]
#[command(name = "deskpilot")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 실행할 목표 (여러 번 지정하면 순서대로 대기열에 들어감)
    #[arg(long, short = 'g', required = true)]
    goal: Vec<String>,

    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 config.json)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// 실제 입력 없이 실행 (NoOp 입력 드라이버)
    #[arg(long)]
    dry_run: bool,

    /// 서브태스크당 최대 반복 횟수
    #[arg(long)]
    max_iterations: Option<u32>,
}

fn init_tracing(level: &str) {
    let filter = format!(
        "deskpilot={level},deskpilot_app={level},deskpilot_core={level},deskpilot_vision={level},deskpilot_automation={level},deskpilot_decision={level},deskpilot_agent={level}"
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter)),
        )
        .init();
}

/// 이벤트를 터미널로 출력
fn print_event(event: &AgentEvent) {
    match event {
        AgentEvent::TaskUpdated {
            task_id,
            status,
            message,
        } => println!("[{task_id}] {status}: {message}"),
        AgentEvent::SubtaskUpdated {
            task_id,
            subtask_id,
            description,
            active: true,
            ..
        } => println!("[{task_id}]   ▶ #{subtask_id} {description}"),
        AgentEvent::SubtaskUpdated {
            task_id,
            subtask_id,
            outcome,
            ..
        } => println!("[{task_id}]   ■ #{subtask_id} {outcome:?}"),
        AgentEvent::ActionExecuted {
            task_id, action, ..
        } => match serde_json::to_string(action) {
            Ok(json) => println!("[{task_id}]     · {json}"),
            Err(_) => println!("[{task_id}]     · {}", action.kind.tag()),
        },
        AgentEvent::TokenUsage { .. } => {}
        AgentEvent::Log { task_id, message } => match task_id {
            Some(id) => println!("[{id}]   {message}"),
            None => println!("{message}"),
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    // ── 설정 ──
    let config_manager = match &args.config {
        Some(path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    }
    .context("설정 관리자 초기화 실패")?;
    info!("설정 파일: {:?}", config_manager.config_path());

    let mut config = config_manager.get();
    EnvOverrides::from_env()
        .context("환경 변수 설정 읽기 실패")?
        .apply(&mut config);
    CliOverrides {
        max_iterations: args.max_iterations,
        dry_run: args.dry_run,
    }
    .apply(&mut config);

    // ── 와이어링 ──
    let runtime = build_runtime(&config).context("런타임 조립 실패")?;
    let orchestrator = runtime.orchestrator.clone();
    let tokens = runtime.tokens.clone();

    let mut events = runtime.events.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "이벤트 출력 지연, 일부 생략");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    for goal in &args.goal {
        match orchestrator.submit(goal) {
            Ok(task) => info!(task_id = %task.id, "목표 등록: {goal}"),
            Err(e) => warn!("목표 등록 실패 ({goal}): {e}"),
        }
    }

    // ── 실행 / 종료 ──
    let lifecycle = LifecycleManager::new();
    tokio::select! {
        _ = orchestrator.wait_idle() => {
            info!("모든 태스크 종료");
        }
        _ = lifecycle.wait_for_signal() => {
            info!("종료 요청, 태스크 취소 중");
            orchestrator.cancel_all();
            orchestrator.wait_idle().await;
        }
    }

    printer.abort();

    let tasks = orchestrator.tasks();
    info!(total_tokens = tokens.total(), "DeskPilot 종료");
    for task in &tasks {
        println!("{} [{}] {}: {}", task.id, task.status, task.goal, task.message);
    }

    let failed = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Broken)
        .count();
    if failed > 0 {
        error!(failed, "실패한 태스크 존재");
        bail!("{failed}개 태스크 실패");
    }
    Ok(())
}
