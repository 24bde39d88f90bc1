//! Runtime tests under a paused tokio clock.
//!
//! Each test runs the real runtime against a scripted driver and either the
//! scripted agent or the in-process simulated world. Time only advances when
//! every task is idle, so connect timeouts and reconnect delays elapse
//! instantly and deterministically.

use std::time::Duration;

use tokio::time::sleep;
use wayfarer_agent::{AgentEvent, Vec3, sim::SimConnector, spawn_supervised};
use wayfarer_app::{ControllerConfig, ExitReason, LogLine, Runtime, Severity, Termination};
use wayfarer_harness::{ScriptedConnector, ScriptedDriver, Step, Transcript};

const SPAWN: Vec3 = Vec3::new(0.5, 64.0, 0.5);

fn position_of(transcript: &Transcript, needle: &str) -> Option<usize> {
    transcript.lines().iter().position(|line| line.message.contains(needle))
}

#[tokio::test(start_paused = true)]
async fn sim_session_round_trip() {
    let driver = ScriptedDriver::new([
        Step::line("say hello"),
        Step::Sleep(Duration::from_secs(2)),
        Step::line("query position"),
        Step::line("query players"),
        Step::line("leave"),
        Step::line("exit"),
    ]);
    let transcript = driver.transcript();
    let mut runtime = Runtime::new(driver, SimConnector::default(), ControllerConfig::default());
    runtime.submit("join localhost");

    let reason = runtime.run().await;

    assert!(matches!(reason, Ok(ExitReason::Command)));
    assert!(transcript.contains("Spawned at 0.5, 64.0, 0.5"));
    assert!(transcript.contains("Wayfarer (you): hello"));
    assert!(transcript.contains("Position: 0.5, 64.0, 0.5"));
    assert!(transcript.contains("Players (2): Alex, Steve"));
    let successes = transcript.with_severity(Severity::Success);
    assert_eq!(successes.last().map(String::as_str), Some("Disconnected"));
    assert!(transcript.shut_down());
}

#[tokio::test(start_paused = true)]
async fn input_waits_for_pending_connect() {
    let agent = ScriptedConnector::new();
    let driver = ScriptedDriver::lines(["join localhost", "say hi"]);
    let runtime = Runtime::new(driver, agent.clone(), ControllerConfig::default());
    let handle = runtime.handle();

    let script = async {
        sleep(Duration::from_secs(1)).await;
        assert!(agent.chats().is_empty());

        if let Some(session) = agent.last_session() {
            agent.emit(session, AgentEvent::Spawn { position: SPAWN });
        }
        sleep(Duration::from_secs(1)).await;
        handle.terminate(Termination::Terminate);
    };
    let (reason, ()) = tokio::join!(runtime.run(), script);

    assert!(matches!(reason, Ok(ExitReason::Terminated)));
    assert_eq!(agent.chats(), vec!["hi"]);
}

#[tokio::test(start_paused = true)]
async fn connect_timeout_releases_input() {
    let agent = ScriptedConnector::new();
    let driver = ScriptedDriver::new([
        Step::line("join slow.example.net"),
        Step::line("help"),
        Step::Sleep(Duration::from_secs(60)),
        Step::line("exit"),
    ]);
    let transcript = driver.transcript();
    let runtime = Runtime::new(driver, agent.clone(), ControllerConfig::default());

    let reason = runtime.run().await;

    assert!(matches!(reason, Ok(ExitReason::Command)));
    let timed_out = position_of(&transcript, "Connection timed out after 30s");
    let help = position_of(&transcript, "Commands:");
    assert!(timed_out.is_some());
    assert!(timed_out < help);
    assert_eq!(agent.live_sessions(), 0);
}

#[tokio::test(start_paused = true)]
async fn auto_reconnect_after_server_end() {
    let agent = ScriptedConnector::new();
    agent.auto_spawn_at(Some(SPAWN));
    let driver = ScriptedDriver::lines(["autoreconnect true", "join localhost"]);
    let transcript = driver.transcript();
    let runtime = Runtime::new(driver, agent.clone(), ControllerConfig::default());
    let handle = runtime.handle();

    let script = async {
        sleep(Duration::from_secs(1)).await;
        if let Some(session) = agent.last_session() {
            agent.emit(session, AgentEvent::End { reason: "server restart".into() });
        }
        sleep(Duration::from_secs(3)).await;
        assert_eq!(agent.opened_targets().len(), 1);

        sleep(Duration::from_secs(7)).await;
        handle.terminate(Termination::Interrupt);
    };
    let (reason, ()) = tokio::join!(runtime.run(), script);

    assert!(matches!(reason, Ok(ExitReason::Interrupted)));
    assert_eq!(agent.opened_targets().len(), 2);
    assert!(transcript.contains("Reconnecting to localhost:25565 in 5s"));
    let spawns = transcript.with_severity(Severity::Success);
    assert_eq!(spawns.iter().filter(|m| m.starts_with("Spawned")).count(), 2);
}

#[tokio::test(start_paused = true)]
async fn fault_in_event_is_recovered_and_input_continues() {
    let agent = ScriptedConnector::new();
    agent.auto_spawn_at(Some(SPAWN));
    let driver = ScriptedDriver::new([
        Step::line("autoreconnect true"),
        Step::line("join localhost"),
        Step::Sleep(Duration::from_secs(3)),
        Step::line("help"),
        Step::line("exit"),
    ]);
    let transcript = driver.transcript();
    let runtime = Runtime::new(driver, agent.clone(), ControllerConfig::default());

    let script = async {
        sleep(Duration::from_secs(1)).await;
        agent.panic_in_callbacks(true);
        if let Some(session) = agent.last_session() {
            let chat = AgentEvent::Chat { username: "Alex".into(), message: "hi".into() };
            agent.emit(session, chat);
        }
        sleep(Duration::from_secs(1)).await;
        agent.panic_in_callbacks(false);
    };
    let (reason, ()) = tokio::join!(runtime.run(), script);

    assert!(matches!(reason, Ok(ExitReason::Command)));
    assert!(transcript.contains("Unexpected fault in chat event: scripted callback failure"));
    assert!(transcript.contains("Reconnecting to localhost:25565"));
    assert!(position_of(&transcript, "Commands:") > position_of(&transcript, "Unexpected fault"));
    assert_eq!(agent.live_sessions(), 0);
}

#[tokio::test(start_paused = true)]
async fn supervised_task_fault_reaches_guard() {
    let driver =
        ScriptedDriver::new([Step::Sleep(Duration::from_secs(1)), Step::line("exit")]);
    let transcript = driver.transcript();
    let runtime = Runtime::new(driver, ScriptedConnector::new(), ControllerConfig::default());

    let faults = runtime.handle().faults().clone();
    #[allow(clippy::panic)]
    let _task = spawn_supervised("exploder", faults, async {
        panic!("boom");
    });

    let reason = runtime.run().await;

    assert!(matches!(reason, Ok(ExitReason::Command)));
    assert!(transcript.contains("Unexpected fault in task 'exploder': boom"));
    assert!(transcript.contains("nothing to recover"));
}

#[tokio::test(start_paused = true)]
async fn notices_are_printed() {
    let driver = ScriptedDriver::new([Step::Sleep(Duration::from_secs(1)), Step::Close]);
    let transcript = driver.transcript();
    let runtime = Runtime::new(driver, ScriptedConnector::new(), ControllerConfig::default());
    runtime.handle().notify(LogLine::success("You are running the latest version"));

    let reason = runtime.run().await;

    assert!(matches!(reason, Ok(ExitReason::InputClosed)));
    assert_eq!(transcript.lines(), vec![LogLine::success("You are running the latest version")]);
}

#[tokio::test(start_paused = true)]
async fn ctrl_c_disconnects_and_stops() {
    let agent = ScriptedConnector::new();
    agent.auto_spawn_at(Some(SPAWN));
    let driver = ScriptedDriver::new([
        Step::line("join localhost"),
        Step::Sleep(Duration::from_secs(1)),
        Step::Interrupt,
    ]);
    let transcript = driver.transcript();
    let runtime = Runtime::new(driver, agent.clone(), ControllerConfig::default());

    let reason = runtime.run().await;

    assert!(matches!(reason, Ok(ExitReason::Interrupted)));
    assert_eq!(transcript.lines().last(), Some(&LogLine::success("Disconnected")));
    assert_eq!(agent.live_sessions(), 0);
    assert!(transcript.shut_down());
}

#[tokio::test(start_paused = true)]
async fn clear_reaches_driver() {
    let driver = ScriptedDriver::lines(["clear", "exit"]);
    let transcript = driver.transcript();
    let runtime = Runtime::new(driver, ScriptedConnector::new(), ControllerConfig::default());

    let reason = runtime.run().await;

    assert!(matches!(reason, Ok(ExitReason::Command)));
    assert_eq!(transcript.clears(), 1);
}

#[tokio::test(start_paused = true)]
async fn reconnect_attempt_does_not_hold_input() {
    let agent = ScriptedConnector::new();
    agent.auto_spawn_at(Some(SPAWN));
    let driver = ScriptedDriver::new([
        Step::line("autoreconnect true"),
        Step::line("join localhost"),
        Step::Sleep(Duration::from_secs(8)),
        Step::line("autoreconnect false"),
    ]);
    let transcript = driver.transcript();
    let runtime = Runtime::new(driver, agent.clone(), ControllerConfig::default());
    let handle = runtime.handle();

    let script = async {
        sleep(Duration::from_secs(1)).await;
        agent.auto_spawn_at(None);
        if let Some(session) = agent.last_session() {
            agent.emit(session, AgentEvent::End { reason: "server restart".into() });
        }

        // Reconnect attempt starts at 6s and never spawns.
        sleep(Duration::from_secs(11)).await;
        assert_eq!(agent.opened_targets().len(), 2);
        assert!(transcript.contains("Auto-reconnect disabled"));
        assert!(!transcript.contains("timed out"));

        sleep(Duration::from_secs(40)).await;
        handle.terminate(Termination::Terminate);
    };
    let (reason, ()) = tokio::join!(runtime.run(), script);

    assert!(matches!(reason, Ok(ExitReason::Terminated)));
    assert!(transcript.contains("Connection timed out after 30s"));
    assert_eq!(agent.opened_targets().len(), 2);
    let lines = transcript.lines();
    let reconnects = lines.iter().filter(|line| line.message.contains("Reconnecting")).count();
    assert_eq!(reconnects, 1);
    assert_eq!(agent.live_sessions(), 0);
}

#[tokio::test(start_paused = true)]
async fn leave_during_reconnect_attempt_stops_retrying() {
    let agent = ScriptedConnector::new();
    agent.auto_spawn_at(Some(SPAWN));
    let driver = ScriptedDriver::new([
        Step::line("autoreconnect true"),
        Step::line("join localhost"),
        Step::Sleep(Duration::from_secs(8)),
        Step::line("leave"),
        Step::Sleep(Duration::from_secs(60)),
        Step::line("exit"),
    ]);
    let transcript = driver.transcript();
    let runtime = Runtime::new(driver, agent.clone(), ControllerConfig::default());

    let script = async {
        sleep(Duration::from_secs(1)).await;
        agent.auto_spawn_at(None);
        if let Some(session) = agent.last_session() {
            agent.emit(session, AgentEvent::End { reason: "server restart".into() });
        }
    };
    let (reason, ()) = tokio::join!(runtime.run(), script);

    assert!(matches!(reason, Ok(ExitReason::Command)));
    assert!(transcript.contains("Connect attempt cancelled"));
    assert!(!transcript.contains("timed out"));
    assert_eq!(agent.opened_targets().len(), 2);
    assert_eq!(agent.live_sessions(), 0);
}

#[tokio::test(start_paused = true)]
async fn end_of_input_runs_queued_lines_first() {
    let driver = ScriptedDriver::new([
        Step::line("join localhost"),
        Step::line("say hello"),
        Step::line("query position"),
        Step::Close,
    ]);
    let transcript = driver.transcript();
    let runtime = Runtime::new(driver, SimConnector::default(), ControllerConfig::default());

    let reason = runtime.run().await;

    assert!(matches!(reason, Ok(ExitReason::InputClosed)));
    let spawned = position_of(&transcript, "Spawned at");
    let reported = position_of(&transcript, "Position: 0.5, 64.0, 0.5");
    assert!(spawned.is_some());
    assert!(spawned < reported);
    assert_eq!(transcript.lines().last(), Some(&LogLine::success("Disconnected")));
}

#[tokio::test(start_paused = true)]
async fn end_of_input_still_honours_connect_timeout() {
    let agent = ScriptedConnector::new();
    let driver =
        ScriptedDriver::new([Step::line("join slow.example.net"), Step::line("help"), Step::Close]);
    let transcript = driver.transcript();
    let runtime = Runtime::new(driver, agent.clone(), ControllerConfig::default());

    let reason = runtime.run().await;

    assert!(matches!(reason, Ok(ExitReason::InputClosed)));
    let timed_out = position_of(&transcript, "Connection timed out after 30s");
    assert!(timed_out.is_some());
    assert!(timed_out < position_of(&transcript, "Commands:"));
    assert_eq!(agent.live_sessions(), 0);
}
