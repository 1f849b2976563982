use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use rand::Rng;
use rollcall_db::models::{
    ClassifierStrategy, Meeting, MeetingParticipant, MeetingStatus, ParticipantSession,
    StudentInfo,
};

use super::base::{BaseDao, DaoError, DaoResult, PaginatedResult, PaginationParams};

pub struct MeetingDao {
    pub base: BaseDao<Meeting>,
    pub participants: BaseDao<MeetingParticipant>,
}

#[derive(Debug, Clone)]
pub struct NewMeeting {
    pub topic: String,
    pub description: Option<String>,
    pub duration: Option<u32>,
    pub start_time: Option<DateTime>,
    pub end_time: Option<DateTime>,
    pub attendance_threshold: u32,
    pub classifier: ClassifierStrategy,
}

impl MeetingDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Meeting::COLLECTION),
            participants: BaseDao::new(db, MeetingParticipant::COLLECTION),
        }
    }

    pub async fn create(&self, organizer_id: ObjectId, spec: NewMeeting) -> DaoResult<Meeting> {
        let organizer_id = Some(organizer_id);
        let meeting_code = generate_meeting_code();
        let now = DateTime::now();

        let meeting = Meeting {
            id: None,
            topic: spec.topic,
            description: spec.description,
            status: MeetingStatus::Scheduled,
            duration: spec.duration,
            start_time: spec.start_time,
            end_time: spec.end_time,
            actual_start_time: None,
            actual_end_time: None,
            timezone: None,
            meeting_code,
            passcode: None,
            attendance_threshold: spec.attendance_threshold,
            classifier: spec.classifier,
            organizer_id,
            participant_count: 0,
            peak_participant_count: 0,
            created_at: now,
            updated_at: now,
        };

        let id = self.base.insert_one(&meeting).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_by_code(&self, code: &str) -> DaoResult<Option<Meeting>> {
        self.base.find_one(doc! { "meeting_code": code }).await
    }

    /// Webhook intake may see events for meetings never created through the
    /// API; register them on first contact so sessions have somewhere to land.
    pub async fn find_or_create_by_code(
        &self,
        code: &str,
        topic: Option<&str>,
        attendance_threshold: u32,
        classifier: ClassifierStrategy,
    ) -> DaoResult<Meeting> {
        if let Some(meeting) = self.find_by_code(code).await? {
            return Ok(meeting);
        }

        let now = DateTime::now();
        let meeting = Meeting {
            id: None,
            topic: topic.unwrap_or("Untitled meeting").to_string(),
            description: None,
            status: MeetingStatus::Scheduled,
            duration: None,
            start_time: None,
            end_time: None,
            actual_start_time: None,
            actual_end_time: None,
            timezone: None,
            meeting_code: code.to_string(),
            passcode: None,
            attendance_threshold,
            classifier,
            organizer_id: None,
            participant_count: 0,
            peak_participant_count: 0,
            created_at: now,
            updated_at: now,
        };

        match self.base.insert_one(&meeting).await {
            Ok(id) => self.base.find_by_id(id).await,
            // Lost the race against a concurrent webhook delivery
            Err(DaoError::DuplicateKey(_)) => self
                .find_by_code(code)
                .await?
                .ok_or(DaoError::NotFound),
            Err(e) => Err(e),
        }
    }

    pub async fn start(&self, meeting_id: ObjectId) -> DaoResult<bool> {
        self.base
            .update_by_id(
                meeting_id,
                doc! {
                    "$set": {
                        "status": "in_progress",
                        "actual_start_time": DateTime::now(),
                    }
                },
            )
            .await
    }

    /// Ends the meeting and closes every session still open, so nobody is
    /// left "in progress" against a finished meeting.
    pub async fn end(&self, meeting_id: ObjectId) -> DaoResult<bool> {
        let now = DateTime::now();
        self.close_open_sessions(meeting_id, now).await?;
        self.base
            .update_by_id(
                meeting_id,
                doc! {
                    "$set": {
                        "status": "ended",
                        "actual_end_time": now,
                    }
                },
            )
            .await
    }

    /// Opens a session for a participant, creating the roster entry on first
    /// join. Joining again with a session already open is a no-op, so
    /// duplicate webhook deliveries don't stack open sessions.
    pub async fn join_participant(
        &self,
        meeting_id: ObjectId,
        user_id: Option<ObjectId>,
        display_name: &str,
        email: Option<String>,
        device_type: &str,
        student_info: Option<StudentInfo>,
        joined_at: Option<DateTime>,
    ) -> DaoResult<MeetingParticipant> {
        let joined_at = joined_at.unwrap_or_else(DateTime::now);
        let filter = match user_id {
            Some(uid) => doc! { "meeting_id": meeting_id, "user_id": uid },
            None => doc! {
                "meeting_id": meeting_id,
                "user_id": null,
                "display_name": display_name,
            },
        };

        if let Some(existing) = self.participants.find_one(filter.clone()).await? {
            if !existing.has_open_session() {
                let session = ParticipantSession {
                    joined_at,
                    left_at: None,
                    device_type: device_type.to_string(),
                };
                self.participants
                    .update_one(
                        filter,
                        doc! { "$push": { "sessions": bson::to_bson(&session)? } },
                    )
                    .await?;
                self.bump_peak(meeting_id).await?;
            }
            return self.participants.find_by_id(existing.id.unwrap()).await;
        }

        let now = DateTime::now();
        let participant = MeetingParticipant {
            id: None,
            meeting_id,
            user_id,
            display_name: display_name.to_string(),
            email,
            is_external: user_id.is_none(),
            student_info,
            sessions: vec![ParticipantSession {
                joined_at,
                left_at: None,
                device_type: device_type.to_string(),
            }],
            created_at: now,
            updated_at: now,
        };

        let id = self.participants.insert_one(&participant).await?;
        self.base
            .update_by_id(meeting_id, doc! { "$inc": { "participant_count": 1 } })
            .await?;
        self.bump_peak(meeting_id).await?;

        self.participants.find_by_id(id).await
    }

    /// Closes the participant's open sessions. Idempotent: already-closed
    /// sessions are untouched.
    pub async fn leave_participant(
        &self,
        meeting_id: ObjectId,
        user_id: Option<ObjectId>,
        display_name: &str,
        left_at: Option<DateTime>,
    ) -> DaoResult<bool> {
        let left_at = left_at.unwrap_or_else(DateTime::now);
        let filter = match user_id {
            Some(uid) => doc! { "meeting_id": meeting_id, "user_id": uid },
            None => doc! {
                "meeting_id": meeting_id,
                "user_id": null,
                "display_name": display_name,
            },
        };
        let update = doc! {
            "$set": {
                "sessions.$[elem].left_at": left_at,
                "updated_at": DateTime::now(),
            }
        };
        let opts = mongodb::options::UpdateOptions::builder()
            .array_filters(vec![doc! { "elem.left_at": null }])
            .build();
        let result = self
            .participants
            .collection()
            .update_one(filter, update)
            .with_options(opts)
            .await
            .map_err(DaoError::Mongo)?;

        Ok(result.modified_count > 0)
    }

    /// Closes every open session in the meeting (used when the meeting ends).
    pub async fn close_open_sessions(
        &self,
        meeting_id: ObjectId,
        left_at: DateTime,
    ) -> DaoResult<u64> {
        let update = doc! {
            "$set": {
                "sessions.$[elem].left_at": left_at,
                "updated_at": DateTime::now(),
            }
        };
        let opts = mongodb::options::UpdateOptions::builder()
            .array_filters(vec![doc! { "elem.left_at": null }])
            .build();
        let result = self
            .participants
            .collection()
            .update_many(doc! { "meeting_id": meeting_id }, update)
            .with_options(opts)
            .await
            .map_err(DaoError::Mongo)?;
        Ok(result.modified_count)
    }

    /// Attaches an authenticated account to a roster entry created from an
    /// anonymous join (QR check-in, webhook).
    pub async fn link_participant(
        &self,
        participant_id: ObjectId,
        user_id: ObjectId,
        student_info: Option<StudentInfo>,
    ) -> DaoResult<bool> {
        let mut set = doc! { "user_id": user_id, "is_external": false };
        if let Some(info) = student_info {
            set.insert("student_info", bson::to_bson(&info)?);
        }
        self.participants
            .update_by_id(participant_id, doc! { "$set": set })
            .await
    }

    pub async fn list_participants(
        &self,
        meeting_id: ObjectId,
    ) -> DaoResult<Vec<MeetingParticipant>> {
        self.participants
            .find_many(
                doc! { "meeting_id": meeting_id },
                Some(doc! { "created_at": 1 }),
            )
            .await
    }

    pub async fn list(
        &self,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<Meeting>> {
        self.base
            .find_paginated(doc! {}, Some(doc! { "created_at": -1 }), params)
            .await
    }

    pub async fn in_progress_ids(&self) -> DaoResult<Vec<ObjectId>> {
        let meetings = self
            .base
            .find_many(doc! { "status": "in_progress" }, None)
            .await?;
        Ok(meetings.into_iter().filter_map(|m| m.id).collect())
    }

    /// Upserts a roster entry from a normalized external payload, replacing
    /// its session list wholesale. Matching is by linked user when the
    /// source carried one, otherwise by display name.
    pub async fn import_roster_entry(
        &self,
        meeting_id: ObjectId,
        record: &crate::attendance::types::ParticipantRecord,
    ) -> DaoResult<()> {
        let user_id = record
            .authenticated_user
            .as_ref()
            .and_then(|u| ObjectId::parse_str(&u.user_id).ok());

        let filter = match user_id {
            Some(uid) => doc! { "meeting_id": meeting_id, "user_id": uid },
            None => doc! {
                "meeting_id": meeting_id,
                "user_id": null,
                "display_name": &record.display_name,
            },
        };

        let sessions: Vec<ParticipantSession> = record
            .sessions
            .iter()
            .filter_map(|s| {
                s.join_time.map(|join| ParticipantSession {
                    joined_at: DateTime::from_chrono(join),
                    left_at: s.leave_time.map(DateTime::from_chrono),
                    device_type: "import".to_string(),
                })
            })
            .collect();

        let student_info = record.student_info.as_ref().map(|info| StudentInfo {
            student_id: info.student_id.clone(),
            first_name: info.first_name.clone(),
            last_name: info.last_name.clone(),
            department: info.department.clone(),
        });

        if let Some(existing) = self.participants.find_one(filter.clone()).await? {
            let mut set = doc! { "sessions": bson::to_bson(&sessions)? };
            if let Some(email) = &record.email {
                set.insert("email", email);
            }
            if let Some(info) = &student_info {
                set.insert("student_info", bson::to_bson(info)?);
            }
            self.participants
                .update_by_id(existing.id.unwrap(), doc! { "$set": set })
                .await?;
        } else {
            let now = DateTime::now();
            let participant = MeetingParticipant {
                id: None,
                meeting_id,
                user_id,
                display_name: record.display_name.clone(),
                email: record.email.clone(),
                is_external: user_id.is_none(),
                student_info,
                sessions,
                created_at: now,
                updated_at: now,
            };
            self.participants.insert_one(&participant).await?;
            self.base
                .update_by_id(meeting_id, doc! { "$inc": { "participant_count": 1 } })
                .await?;
        }

        Ok(())
    }

    async fn bump_peak(&self, meeting_id: ObjectId) -> DaoResult<()> {
        let active = self
            .participants
            .count(doc! {
                "meeting_id": meeting_id,
                "sessions": { "$elemMatch": { "left_at": null } },
            })
            .await?;
        self.base
            .update_by_id(
                meeting_id,
                doc! { "$max": { "peak_participant_count": active as i64 } },
            )
            .await?;
        Ok(())
    }
}

fn generate_meeting_code() -> String {
    let mut rng = rand::rng();
    let parts: Vec<String> = (0..3)
        .map(|_| {
            let n: u32 = rng.random_range(100..999);
            n.to_string()
        })
        .collect();
    parts.join("-")
}
