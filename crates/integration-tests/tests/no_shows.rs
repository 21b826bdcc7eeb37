//! No-show recording and counter invariants.
//!
//! Run with: cargo test -p casanova-integration-tests --test no_shows

use casanova_core::ReservationStatus;
use casanova_integration_tests::{date, memory_tracking, restaurant, seed_reservation};
use casanova_tracking::{CustomerUpdate, NoShowOutcome, TrackingError};

#[tokio::test]
async fn test_no_show_scenario() {
    let tracking = memory_tracking();
    let restaurant = restaurant();
    let contact = tracking.contact("gina@example.com", "");

    for day in [1, 8] {
        tracking
            .ledger()
            .record_reservation(&restaurant, &contact, "Gina", date(2026, 2, day))
            .await
            .expect("tracked");
    }
    let reservation = seed_reservation(&tracking, "gina@example.com", "", date(2026, 2, 8));

    let outcome = tracking
        .recorder()
        .mark_no_show_once(&restaurant, reservation.id, None)
        .await
        .expect("recorded");

    let NoShowOutcome::Recorded {
        reservation,
        customer: CustomerUpdate::Skipped,
    } = outcome
    else {
        panic!("unlinked reservation should not touch any customer");
    };
    assert_eq!(reservation.status, ReservationStatus::NoShow);

    // Link explicitly through the matched customer.
    let customer = tracking
        .lookup(&restaurant, &contact)
        .await
        .expect("lookup")
        .expect("customer");
    let second = seed_reservation(&tracking, "gina@example.com", "", date(2026, 2, 15));
    let outcome = tracking
        .recorder()
        .mark_no_show_once(&restaurant, second.id, Some(customer.id))
        .await
        .expect("recorded");

    let NoShowOutcome::Recorded {
        customer: CustomerUpdate::Incremented(updated),
        ..
    } = outcome
    else {
        panic!("expected an increment");
    };
    assert_eq!(updated.total_reservations, 2);
    assert_eq!(updated.no_show_count, 1);
    assert_eq!(updated.last_no_show_date, Some(chrono::Utc::now().date_naive()));
    assert!(updated.history().has_no_shows);
}

#[tokio::test]
async fn test_unguarded_repeat_counts_twice_guarded_counts_once() {
    let tracking = memory_tracking();
    let restaurant = restaurant();
    let contact = tracking.contact("hugo@example.com", "");
    let customer_id = {
        let ledger = tracking.ledger();
        for day in 1..=3 {
            ledger
                .record_reservation(&restaurant, &contact, "Hugo", date(2026, 1, day))
                .await;
        }
        ledger
            .record_reservation(&restaurant, &contact, "Hugo", date(2026, 1, 4))
            .await
            .expect("tracked")
    };

    let first = seed_reservation(&tracking, "hugo@example.com", "", date(2026, 1, 1));
    for _ in 0..2 {
        tracking
            .recorder()
            .mark_no_show(&restaurant, first.id, Some(customer_id))
            .await
            .expect("marked");
    }

    let second = seed_reservation(&tracking, "hugo@example.com", "", date(2026, 1, 2));
    for _ in 0..2 {
        tracking
            .recorder()
            .mark_no_show_once(&restaurant, second.id, Some(customer_id))
            .await
            .expect("marked");
    }

    let customer = tracking
        .store()
        .customers(&restaurant)
        .expect("snapshot")
        .into_iter()
        .find(|c| c.id == customer_id)
        .expect("customer");
    assert_eq!(customer.no_show_count, 3);
}

#[tokio::test]
async fn test_no_show_count_never_exceeds_total() {
    let tracking = memory_tracking();
    let restaurant = restaurant();
    let customer_id = tracking
        .ledger()
        .record_reservation(
            &restaurant,
            &tracking.contact("ines@example.com", ""),
            "Ines",
            date(2026, 1, 10),
        )
        .await
        .expect("tracked");

    let mut updates = Vec::new();
    for day in 10..=12 {
        let reservation = seed_reservation(&tracking, "ines@example.com", "", date(2026, 1, day));
        updates.push(
            tracking
                .recorder()
                .mark_no_show(&restaurant, reservation.id, Some(customer_id))
                .await
                .expect("reservation side succeeds"),
        );
    }

    assert!(matches!(updates.first(), Some(CustomerUpdate::Incremented(_))));
    assert!(
        updates
            .iter()
            .skip(1)
            .all(|u| matches!(u, CustomerUpdate::Failed(_)))
    );

    let customer = tracking
        .store()
        .customers(&restaurant)
        .expect("snapshot")
        .into_iter()
        .next()
        .expect("customer");
    assert_eq!(customer.total_reservations, 1);
    assert_eq!(customer.no_show_count, 1);
}

#[tokio::test]
async fn test_status_updates_cannot_fake_a_no_show() {
    let tracking = memory_tracking();
    let restaurant = restaurant();
    let reservation = seed_reservation(&tracking, "jade@example.com", "", date(2026, 1, 20));

    let result = tracking
        .recorder()
        .update_status(&restaurant, reservation.id, ReservationStatus::NoShow)
        .await;
    assert!(matches!(result, Err(TrackingError::Validation(_))));

    let skipped = tracking
        .recorder()
        .update_status(&restaurant, reservation.id, ReservationStatus::Seated)
        .await;
    assert!(matches!(skipped, Err(TrackingError::Validation(_))));

    for status in [ReservationStatus::Confirmed, ReservationStatus::Seated] {
        let updated = tracking
            .recorder()
            .update_status(&restaurant, reservation.id, status)
            .await
            .expect("lifecycle step");
        assert_eq!(updated.status, status);
    }

    let late = tracking
        .recorder()
        .mark_no_show_once(&restaurant, reservation.id, None)
        .await;
    assert!(matches!(late, Err(TrackingError::Validation(_))));
}

#[tokio::test]
async fn test_terminal_statuses_cannot_be_reopened() {
    let tracking = memory_tracking();
    let restaurant = restaurant();
    let customer_id = tracking
        .ledger()
        .record_reservation(
            &restaurant,
            &tracking.contact("kira@example.com", ""),
            "Kira",
            date(2026, 1, 21),
        )
        .await
        .expect("tracked");
    for day in 22..=23 {
        tracking
            .ledger()
            .record_reservation(
                &restaurant,
                &tracking.contact("kira@example.com", ""),
                "Kira",
                date(2026, 1, day),
            )
            .await;
    }

    // A no-show stays a no-show, so it is only ever counted once.
    let missed = seed_reservation(&tracking, "kira@example.com", "", date(2026, 1, 21));
    tracking
        .recorder()
        .mark_no_show_once(&restaurant, missed.id, Some(customer_id))
        .await
        .expect("recorded");
    let reopened = tracking
        .recorder()
        .update_status(&restaurant, missed.id, ReservationStatus::Pending)
        .await;
    assert!(matches!(reopened, Err(TrackingError::Validation(_))));
    let again = tracking
        .recorder()
        .mark_no_show_once(&restaurant, missed.id, Some(customer_id))
        .await
        .expect("idempotent");
    assert!(matches!(again, NoShowOutcome::AlreadyRecorded(_)));

    // Completed is terminal too.
    let visit = seed_reservation(&tracking, "kira@example.com", "", date(2026, 1, 22));
    for status in [
        ReservationStatus::Confirmed,
        ReservationStatus::Seated,
        ReservationStatus::Completed,
    ] {
        tracking
            .recorder()
            .update_status(&restaurant, visit.id, status)
            .await
            .expect("lifecycle step");
    }
    let reopened = tracking
        .recorder()
        .update_status(&restaurant, visit.id, ReservationStatus::Pending)
        .await;
    assert!(matches!(reopened, Err(TrackingError::Validation(_))));

    let customer = tracking
        .lookup(&restaurant, &tracking.contact("kira@example.com", ""))
        .await
        .expect("lookup")
        .expect("customer");
    assert_eq!(customer.no_show_count, 1);
}
