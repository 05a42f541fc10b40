//! End-to-end lifecycle against a shell script standing in for the payload.
#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use jarstarter_core::{LauncherPaths, ProcessState, Settings, StartOutcome, StatusTone};
use jarstarter_runtime::{
    ChannelDispatcher, HealthTarget, Launcher, LogBuffer, ProcessSupervisor, ResourceProvisioner,
    StatusStore,
};
use tokio::net::TcpListener;
use tokio::time::{Instant, sleep};

const TICK: Duration = Duration::from_millis(20);

fn settings() -> Settings {
    Settings {
        runtime_entry: "bin/java".to_string(),
        runtime_args: Vec::new(),
        payload_flag: None,
        dev_payload_path: None,
        ..Settings::default()
    }
}

/// Lay out a resource root with a fake runtime and a sleeping payload.
fn write_resources(resource_root: &Path) {
    let runtime = resource_root.join("embedded-runtime");
    fs::create_dir_all(runtime.join("bin")).unwrap();
    fs::write(runtime.join("bin/java"), "#!/bin/sh\nexec /bin/sh \"$@\"\n").unwrap();
    fs::write(runtime.join("release"), "JAVA_VERSION=\"1.8.0_202\"\n").unwrap();

    let payload = resource_root.join("payload");
    fs::create_dir_all(&payload).unwrap();
    fs::write(payload.join("myJar.jar"), "echo payload up\nsleep 30\n").unwrap();
}

async fn wait_for_label(store: &StatusStore, label: &str) -> bool {
    let deadline = Instant::now() + Duration::from_secs(3);
    while Instant::now() < deadline {
        if store.get().label == label {
            return true;
        }
        sleep(TICK).await;
    }
    false
}

#[tokio::test]
async fn fresh_install_provisions_starts_and_stops() {
    let tmp = tempfile::tempdir().unwrap();
    let resource_root = tmp.path().join("resources");
    write_resources(&resource_root);

    let settings = settings();
    let paths = LauncherPaths::from_roots(
        tmp.path().join("data"),
        &resource_root,
        &settings.runtime_version,
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let (dispatcher, mut updates) = ChannelDispatcher::channel();
    let store = Arc::new(StatusStore::with_dispatcher(Arc::new(dispatcher)));
    let logs = Arc::new(LogBuffer::default());
    let supervisor = ProcessSupervisor::new(&settings, Arc::clone(&store), logs.clone())
        .with_health_target(HealthTarget {
            host: "127.0.0.1".to_string(),
            port,
            interval: TICK,
        });
    let launcher = Launcher::new(
        paths.clone(),
        ResourceProvisioner::from_layout(&paths, &settings),
        supervisor,
    );

    let outcome = launcher.start().await.unwrap();
    assert!(matches!(outcome, StartOutcome::Started { .. }));

    // Runtime tree and payload were materialized under the data root
    assert!(paths.runtime_dir.join("bin/java").is_file());
    assert!(paths.runtime_dir.join("release").is_file());
    assert!(paths.payload_file("myJar.jar").is_file());
    assert!(paths.work_dir.is_dir());

    assert!(wait_for_label(&store, "Running").await);
    let snapshot = store.get();
    assert!(snapshot.is_running);
    assert_eq!(snapshot.tone, StatusTone::Ok);
    assert!(launcher.supervisor().monitor().observation().observed_at.is_some());

    launcher.stop().await.unwrap();

    assert_eq!(launcher.supervisor().state().await, ProcessState::Stopped);
    let last = store.get();
    assert_eq!(last.label, "Stopped");
    assert!(!last.is_running);

    // Dispatcher saw every write, ending with the stop
    let mut dispatched = Vec::new();
    while let Ok(snapshot) = updates.try_recv() {
        dispatched.push(snapshot);
    }
    assert_eq!(u64::try_from(dispatched.len()).unwrap(), last.revision);
    assert_eq!(dispatched.last().map(|s| s.label.as_str()), Some("Stopped"));

    assert!(logs.lines().contains(&"payload up".to_string()));
    drop(listener);
}

#[tokio::test]
async fn second_launch_reuses_provisioned_resources() {
    let tmp = tempfile::tempdir().unwrap();
    let resource_root = tmp.path().join("resources");
    write_resources(&resource_root);

    let settings = settings();
    let paths = LauncherPaths::from_roots(
        tmp.path().join("data"),
        &resource_root,
        &settings.runtime_version,
    );
    let provisioner = ResourceProvisioner::from_layout(&paths, &settings);

    let (runtime, payload) = provisioner.provision_all().unwrap();
    assert!(runtime.extracted);

    // Bundle disappears; cached copies must be enough
    fs::remove_dir_all(&resource_root).unwrap();

    let (runtime_again, payload_again) = provisioner.provision_all().unwrap();
    assert!(!runtime_again.extracted);
    assert_eq!(runtime.executable_path, runtime_again.executable_path);
    assert_eq!(payload.artifact_path, payload_again.artifact_path);
}

#[tokio::test]
async fn concurrent_starts_spawn_one_child() {
    let tmp = tempfile::tempdir().unwrap();
    let payload = tmp.path().join("payload.sh");
    fs::write(&payload, "sleep 30\n").unwrap();
    let work_dir = tmp.path().join("work");

    let supervisor = Arc::new(
        ProcessSupervisor::new(
            &settings(),
            Arc::new(StatusStore::new()),
            Arc::new(LogBuffer::default()),
        )
        .with_health_target(HealthTarget {
            host: "127.0.0.1".to_string(),
            port: 1,
            interval: Duration::from_secs(1),
        }),
    );

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let supervisor = Arc::clone(&supervisor);
        let payload = payload.clone();
        let work_dir = work_dir.clone();
        tasks.push(tokio::spawn(async move {
            supervisor
                .start(Path::new("/bin/sh"), &payload, &work_dir)
                .await
                .unwrap()
        }));
    }

    let mut outcomes = Vec::new();
    for task in tasks {
        outcomes.push(task.await.unwrap());
    }

    let started: Vec<_> = outcomes
        .iter()
        .filter(|o| matches!(o, StartOutcome::Started { .. }))
        .collect();
    assert_eq!(started.len(), 1);

    let pid = started[0].pid();
    assert!(outcomes.iter().all(|o| o.pid() == pid));

    supervisor.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_launches_on_fresh_root_provision_once() {
    let tmp = tempfile::tempdir().unwrap();
    let resource_root = tmp.path().join("resources");
    write_resources(&resource_root);
    let lib = resource_root.join("embedded-runtime/lib");
    fs::create_dir_all(&lib).unwrap();
    for i in 0..200 {
        fs::write(lib.join(format!("part{i}.jar")), format!("classes {i}")).unwrap();
    }

    let settings = settings();
    let paths = LauncherPaths::from_roots(
        tmp.path().join("data"),
        &resource_root,
        &settings.runtime_version,
    );
    let store = Arc::new(StatusStore::new());
    let supervisor =
        ProcessSupervisor::new(&settings, Arc::clone(&store), Arc::new(LogBuffer::default()))
            .with_health_target(HealthTarget {
                host: "127.0.0.1".to_string(),
                port: 1,
                interval: Duration::from_secs(1),
            });
    let launcher = Arc::new(Launcher::new(
        paths.clone(),
        ResourceProvisioner::from_layout(&paths, &settings),
        supervisor,
    ));

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let launcher = Arc::clone(&launcher);
            tokio::spawn(async move { launcher.start().await })
        })
        .collect();
    let mut outcomes = Vec::new();
    for task in tasks {
        outcomes.push(task.await.unwrap().unwrap());
    }

    let started = outcomes
        .iter()
        .filter(|o| matches!(o, StartOutcome::Started { .. }))
        .count();
    assert_eq!(started, 1);
    let pid = outcomes[0].pid();
    assert!(outcomes.iter().all(|o| o.pid() == pid));

    assert!(paths.runtime_dir.join("bin/java").is_file());
    for i in 0..200 {
        assert!(paths.runtime_dir.join(format!("lib/part{i}.jar")).is_file());
    }
    assert!(!store.get().label.starts_with("Start failed"));

    launcher.stop().await.unwrap();
    assert_eq!(store.get().label, "Stopped");
}

#[tokio::test]
async fn missing_payload_fails_launch_with_error_status() {
    let tmp = tempfile::tempdir().unwrap();
    let resource_root = tmp.path().join("resources");
    write_resources(&resource_root);
    fs::remove_dir_all(resource_root.join("payload")).unwrap();

    let settings = settings();
    let paths = LauncherPaths::from_roots(
        tmp.path().join("data"),
        &resource_root,
        &settings.runtime_version,
    );
    let store = Arc::new(StatusStore::new());
    let launcher = Launcher::new(
        paths.clone(),
        ResourceProvisioner::from_layout(&paths, &settings),
        ProcessSupervisor::new(&settings, Arc::clone(&store), Arc::new(LogBuffer::default())),
    );

    assert!(launcher.start().await.is_err());

    let snapshot = store.get();
    assert!(snapshot.label.starts_with("Start failed"));
    assert_eq!(snapshot.tone, StatusTone::Error);
    assert_eq!(launcher.supervisor().pid().await, None);
}
