//! End-to-end assignment flow over the in-memory store.

use dispatch_core::geo::Coord;
use dispatch_core::task::{Task, TaskLocation, TaskPriority, TaskStatus};
use dispatch_core::volunteer::{Volunteer, VolunteerStatus};
use dispatch_engine::{DeduplicationGuard, LifecycleController, MatchingEngine, TaskFeedListener};
use dispatch_store::{AssignmentStore, InMemoryStore};
use std::sync::Arc;
use std::time::Duration;

struct Deployment {
    store: Arc<InMemoryStore>,
    guard: Arc<DeduplicationGuard>,
}

/// Wire up the full stack the way a dashboard process would.
fn deploy() -> Deployment {
    let store = Arc::new(InMemoryStore::new());
    let guard = Arc::new(DeduplicationGuard::new());
    let engine = Arc::new(MatchingEngine::new(Arc::clone(&store)));
    let listener = TaskFeedListener::new(Arc::clone(&store), engine, Arc::clone(&guard))
        .with_trigger_jitter(Some(Duration::from_millis(20)));
    tokio::spawn(listener.run());
    Deployment { store, guard }
}

async fn wait_for_status(store: &InMemoryStore, task_id: &str, status: TaskStatus) -> Task {
    for _ in 0..300 {
        let task = store.task(task_id).await.unwrap();
        if task.status == status {
            return task;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("task {task_id} never reached {status:?}");
}

async fn seed_pool(store: &InMemoryStore) {
    let v1 = Volunteer::new(
        "v1",
        "Dr. Sarah Ahmed",
        vec!["medical".into()],
        Coord::new(12.82, 80.04),
    );
    let v2 = Volunteer::new(
        "v2",
        "Fire Chief Kumar",
        vec!["fire".into()],
        Coord::new(12.83, 80.05),
    );
    let mut v3 = Volunteer::new(
        "v3",
        "Paramedic Lisa",
        vec!["medical".into()],
        Coord::new(12.825, 80.045),
    );
    v3.status = VolunteerStatus::Busy;
    v3.current_assignment = Some("elsewhere".into());

    store.create_volunteer(v1).await.unwrap();
    store.create_volunteer(v2).await.unwrap();
    store.create_volunteer(v3).await.unwrap();
}

#[tokio::test]
async fn medical_request_goes_to_the_nearby_medic() {
    let deployment = deploy();
    let store = &deployment.store;
    tokio::time::sleep(Duration::from_millis(20)).await;

    seed_pool(store).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    store
        .create_task(Task::request(
            "t1",
            "medical",
            TaskPriority::High,
            TaskLocation::new(12.821, 80.041, "Block C shelter"),
        ))
        .await
        .unwrap();

    let task = wait_for_status(store, "t1", TaskStatus::Assigned).await;

    // V1 is both closest (~0.15 km vs ~1.4 km) and skill-matched.
    assert_eq!(task.assigned_volunteer_id.as_deref(), Some("v1"));
    assert_eq!(task.assigned_volunteer_name.as_deref(), Some("Dr. Sarah Ahmed"));
    let distance = task.estimated_distance_km.unwrap();
    assert!(distance < 0.2, "unexpected distance {distance}");
    assert!(task.estimated_arrival_min.unwrap() <= 1);
    assert!(task.assigned_at.is_some());

    let v1 = store.volunteer("v1").await.unwrap();
    assert_eq!(v1.status, VolunteerStatus::Busy);
    assert_eq!(v1.current_assignment.as_deref(), Some("t1"));

    // The busy medic was never considered.
    let v3 = store.volunteer("v3").await.unwrap();
    assert_eq!(v3.current_assignment.as_deref(), Some("elsewhere"));
}

#[tokio::test]
async fn completion_frees_the_volunteer_for_the_next_task() {
    let deployment = deploy();
    let store = &deployment.store;
    tokio::time::sleep(Duration::from_millis(20)).await;

    store
        .create_volunteer(Volunteer::new(
            "v1",
            "Dr. Sarah Ahmed",
            vec!["medical".into(), "sos".into()],
            Coord::new(12.82, 80.04),
        ))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    store
        .create_task(Task::sos("t1", TaskLocation::new(12.821, 80.041, "")))
        .await
        .unwrap();
    wait_for_status(store, "t1", TaskStatus::Assigned).await;

    let lifecycle =
        LifecycleController::new(Arc::clone(store), Arc::clone(&deployment.guard));
    lifecycle.complete("t1", "v1").await.unwrap();

    let v1 = store.volunteer("v1").await.unwrap();
    assert!(v1.is_available());
    assert_eq!(v1.completed_tasks, 1);

    // The released volunteer can immediately take the next alert.
    store
        .create_task(Task::sos("t2", TaskLocation::new(12.822, 80.042, "")))
        .await
        .unwrap();
    let t2 = wait_for_status(store, "t2", TaskStatus::Assigned).await;
    assert_eq!(t2.assigned_volunteer_id.as_deref(), Some("v1"));
}

#[tokio::test]
async fn sos_with_empty_pool_waits_then_recovers_on_reset() {
    let deployment = deploy();
    let store = &deployment.store;
    tokio::time::sleep(Duration::from_millis(20)).await;

    let mut busy = Volunteer::new(
        "v1",
        "Dr. Sarah Ahmed",
        vec!["medical".into()],
        Coord::new(12.82, 80.04),
    );
    busy.status = VolunteerStatus::Busy;
    busy.current_assignment = Some("stuck".into());
    store.create_volunteer(busy).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    store
        .create_task(Task::sos("t1", TaskLocation::new(12.821, 80.041, "")))
        .await
        .unwrap();
    wait_for_status(store, "t1", TaskStatus::WaitingVolunteers).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Operator recovery: reset frees the stuck volunteer, whose
    // availability snapshot re-triggers the waiting alert.
    let lifecycle =
        LifecycleController::new(Arc::clone(store), Arc::clone(&deployment.guard));
    lifecycle.reset_all().await.unwrap();

    let task = wait_for_status(store, "t1", TaskStatus::Assigned).await;
    assert_eq!(task.assigned_volunteer_id.as_deref(), Some("v1"));
}
