#[cfg(test)]
mod tests {
    use crate::db::{
        ROOM_CODE_LEN, close_room, create_room, create_subject, delete_room, get_all_subjects,
        get_owned_room, get_owned_rooms, join_room_by_code, question_exists, room_code_in_use,
        update_room,
    };
    use crate::error::AppError;
    use crate::test::test_db::{TestDbBuilder, create_standard_test_db};
    use std::collections::HashSet;

    fn assert_room_code_shape(code: &str) {
        assert_eq!(code.len(), ROOM_CODE_LEN);
        assert!(
            code.chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()),
            "Unexpected character in room code {}",
            code
        );
    }

    #[rocket::async_test]
    async fn test_create_room_assigns_unique_codes() {
        let test_db = TestDbBuilder::new()
            .teacher("Ada Lovelace", "ada@example.com")
            .build()
            .await
            .unwrap();
        let ada = test_db.teacher_id("ada@example.com").unwrap();

        let mut codes = HashSet::new();
        for i in 0..20 {
            let room = create_room(&test_db.pool, ada, &format!("Room {}", i), None)
                .await
                .expect("Failed to create room");

            assert!(room.is_open);
            assert_eq!(room.owner_id, ada);
            assert_room_code_shape(&room.room_code);
            assert!(room_code_in_use(&test_db.pool, &room.room_code).await.unwrap());

            codes.insert(room.room_code);
        }

        assert_eq!(codes.len(), 20);
    }

    #[rocket::async_test]
    async fn test_create_room_with_unknown_subject() {
        let test_db = create_standard_test_db().await;
        let ada = test_db.teacher_id("ada@example.com").unwrap();

        match create_room(&test_db.pool, ada, "Physics", Some(999)).await {
            Err(AppError::NotFound(msg)) => assert_eq!(msg, "Subject not found"),
            other => panic!("Expected NotFound, got {:?}", other),
        }

        let algebra = test_db.room("Algebra").unwrap();
        assert_eq!(algebra.subject_id, test_db.subject_id("Mathematics"));
    }

    #[rocket::async_test]
    async fn test_join_open_room_by_code() {
        let test_db = create_standard_test_db().await;
        let algebra = test_db.room("Algebra").unwrap();

        let joined = join_room_by_code(&test_db.pool, &algebra.room_code)
            .await
            .expect("Open room should be joinable");

        assert_eq!(&joined, algebra);
    }

    #[rocket::async_test]
    async fn test_join_closed_room() {
        let test_db = create_standard_test_db().await;
        let geometry = test_db.room("Geometry").unwrap();

        match join_room_by_code(&test_db.pool, &geometry.room_code).await {
            Err(AppError::RoomNotOpen(msg)) => assert_eq!(msg, "Room not found or closed"),
            other => panic!("Expected RoomNotOpen, got {:?}", other),
        }
    }

    #[rocket::async_test]
    async fn test_join_unknown_code() {
        let test_db = TestDbBuilder::new().build().await.unwrap();

        match join_room_by_code(&test_db.pool, "MATH01").await {
            Err(AppError::NotFound(msg)) => assert_eq!(msg, "Room not found or closed"),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[rocket::async_test]
    async fn test_rooms_are_scoped_to_owner() {
        let test_db = create_standard_test_db().await;
        let pool = &test_db.pool;
        let ada = test_db.teacher_id("ada@example.com").unwrap();
        let alan = test_db.teacher_id("alan@example.com").unwrap();
        let algebra = test_db.room_id("Algebra").unwrap();

        let ada_rooms = get_owned_rooms(pool, ada).await.unwrap();
        assert_eq!(ada_rooms.len(), 2);
        assert!(ada_rooms.iter().all(|room| room.owner_id == ada));

        assert!(get_owned_room(pool, algebra, ada).await.is_ok());

        for result in [
            get_owned_room(pool, algebra, alan).await.map(|_| ()),
            update_room(pool, algebra, alan, "Hijacked", None).await.map(|_| ()),
            close_room(pool, algebra, alan).await.map(|_| ()),
            delete_room(pool, algebra, alan).await,
        ] {
            match result {
                Err(AppError::NotFound(msg)) => assert_eq!(msg, "Room not found"),
                other => panic!("Expected NotFound, got {:?}", other),
            }
        }

        let untouched = get_owned_room(pool, algebra, ada).await.unwrap();
        assert_eq!(untouched.title, "Algebra");
        assert!(untouched.is_open);
    }

    #[rocket::async_test]
    async fn test_update_and_close_room() {
        let test_db = create_standard_test_db().await;
        let pool = &test_db.pool;
        let ada = test_db.teacher_id("ada@example.com").unwrap();
        let algebra = test_db.room("Algebra").unwrap().clone();

        let updated = update_room(pool, algebra.id, ada, "Linear Algebra", None)
            .await
            .unwrap();
        assert_eq!(updated.title, "Linear Algebra");
        assert_eq!(updated.subject_id, None);
        assert_eq!(updated.room_code, algebra.room_code);

        let closed = close_room(pool, algebra.id, ada).await.unwrap();
        assert!(!closed.is_open);

        assert!(matches!(
            join_room_by_code(pool, &algebra.room_code).await,
            Err(AppError::RoomNotOpen(_))
        ));
    }

    #[rocket::async_test]
    async fn test_delete_room_removes_questions() {
        let test_db = create_standard_test_db().await;
        let pool = &test_db.pool;
        let ada = test_db.teacher_id("ada@example.com").unwrap();
        let question = test_db.question_id("What is x?").unwrap();

        delete_room(pool, test_db.room_id("Algebra").unwrap(), ada)
            .await
            .unwrap();

        assert!(!question_exists(pool, question).await.unwrap());
    }

    #[rocket::async_test]
    async fn test_subjects() {
        let test_db = TestDbBuilder::new()
            .subject("Physics")
            .subject("Chemistry")
            .build()
            .await
            .unwrap();

        match create_subject(&test_db.pool, "Physics").await {
            Err(AppError::Conflict(msg)) => assert_eq!(msg, "Subject already exists"),
            other => panic!("Expected Conflict, got {:?}", other),
        }

        let names: Vec<String> = get_all_subjects(&test_db.pool)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Chemistry", "Physics"]);
    }
}
