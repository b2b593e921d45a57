//! In-memory persistence for requests, allocated lessons, tutors and
//! availability blocks.
//!
//! The store is the caller that turns the pure allocator and merger outputs into
//! rows. Regenerating a request's lessons and merging a new availability block
//! are each applied as one unit: everything that can fail is computed first,
//! then stale rows are removed and the new rows inserted.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::availability::{plan_merge, sort_for_display, Schedule, TimeBlock};
use crate::calendar::{weekday_label, CalendarConfig};
use crate::error::{Result, SchedulingError};
use crate::lesson::{
    AllocatedLesson, LessonId, LessonRequest, LessonStatus, NewLessonRequest, RequestId,
    ScheduleId, UserId,
};

/// A user who can be assigned lessons, with the subject they teach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tutor {
    pub user: UserId,
    pub subject: String,
}

/// A tutor together with their availability, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TutorListing {
    pub user: UserId,
    pub subject: String,
    /// Sorted Sunday first, then by start time.
    pub schedules: Vec<Schedule>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulingStore {
    last_id: u64,
    tutors: BTreeMap<UserId, Tutor>,
    requests: BTreeMap<RequestId, LessonRequest>,
    lessons: BTreeMap<LessonId, AllocatedLesson>,
    schedules: BTreeMap<ScheduleId, Schedule>,
}

impl SchedulingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from a JSON file, or start empty if the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no state file, starting empty");
            return Ok(Self::new());
        }
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }

    // --- Tutors ---

    /// Register `user` as a tutor of `subject`, replacing any earlier subject.
    pub fn register_tutor(&mut self, user: UserId, subject: &str) -> Result<()> {
        let subject = subject.trim();
        if subject.is_empty() {
            return Err(SchedulingError::InvalidInput(
                "tutor subject cannot be empty".to_string(),
            ));
        }
        self.tutors.insert(
            user,
            Tutor {
                user,
                subject: subject.to_string(),
            },
        );
        info!(%user, subject, "registered tutor");
        Ok(())
    }

    pub fn tutor(&self, user: UserId) -> Result<&Tutor> {
        self.tutors
            .get(&user)
            .ok_or_else(|| SchedulingError::NotFound(format!("tutor {}", user)))
    }

    /// Tutors filtered by exact subject and by having at least one block on
    /// `weekday`. `None` disables a filter.
    pub fn find_tutors(&self, subject: Option<&str>, weekday: Option<Weekday>) -> Vec<TutorListing> {
        self.tutors
            .values()
            .filter(|t| subject.is_none_or(|s| t.subject == s))
            .map(|t| TutorListing {
                user: t.user,
                subject: t.subject.clone(),
                schedules: self.blocks_for(t.user),
            })
            .filter(|listing| {
                weekday.is_none_or(|day| listing.schedules.iter().any(|s| s.weekday == day))
            })
            .collect()
    }

    // --- Lesson requests ---

    /// Record a new, unallocated lesson request.
    ///
    /// # Errors
    /// Returns `SchedulingError::InvalidInput` if the duration is not allowed,
    /// the description is too long, the subject is empty, or the preferred tutor
    /// is not a registered tutor.
    pub fn create_request(
        &mut self,
        config: &CalendarConfig,
        new: NewLessonRequest,
    ) -> Result<RequestId> {
        config.check_duration(new.duration_minutes)?;
        if new.subject.trim().is_empty() {
            return Err(SchedulingError::InvalidInput(
                "subject cannot be empty".to_string(),
            ));
        }
        if new.description.chars().count() > config.max_description_len {
            return Err(SchedulingError::InvalidInput(format!(
                "description cannot exceed {} characters",
                config.max_description_len
            )));
        }
        if let Some(preferred) = new.preferred_tutor {
            if !self.tutors.contains_key(&preferred) {
                return Err(SchedulingError::InvalidInput(format!(
                    "selected user {} is not a tutor",
                    preferred
                )));
            }
        }

        let id = RequestId(self.next_id());
        info!(request = %id, student = %new.student, term = %new.term, "created lesson request");
        self.requests.insert(id, LessonRequest::from_new(id, new));
        Ok(id)
    }

    pub fn request(&self, id: RequestId) -> Result<&LessonRequest> {
        self.requests
            .get(&id)
            .ok_or_else(|| SchedulingError::NotFound(format!("lesson request {}", id)))
    }

    pub fn requests(&self) -> impl Iterator<Item = &LessonRequest> {
        self.requests.values()
    }

    pub fn requests_for_student(&self, student: UserId) -> Vec<&LessonRequest> {
        self.requests
            .values()
            .filter(|r| r.student == student)
            .collect()
    }

    /// Move a request to `status`, returning how many lessons it now has.
    ///
    /// Allocating needs a tutor and a start time, taken from the arguments or
    /// from what the request already carries. The full set of occurrences is
    /// generated before anything is touched; the request's previous lessons are
    /// then replaced. Leaving `allocated` deletes every lesson of the request.
    ///
    /// # Errors
    /// Returns `SchedulingError::MissingAssignment` if allocation lacks a tutor
    /// or start time, and `SchedulingError::NotFound` for an unknown request or
    /// an unregistered tutor. On error the store is unchanged.
    pub fn update_request_status(
        &mut self,
        config: &CalendarConfig,
        id: RequestId,
        status: LessonStatus,
        tutor: Option<UserId>,
        start_time: Option<NaiveTime>,
    ) -> Result<usize> {
        let request = self.request(id)?;

        match status {
            LessonStatus::Allocated => {
                let tutor = tutor
                    .or(request.tutor)
                    .ok_or(SchedulingError::MissingAssignment("tutor"))?;
                self.tutor(tutor)?;
                let start_time = start_time
                    .or(request.start_time)
                    .ok_or(SchedulingError::MissingAssignment("start time"))?;

                let occurrences: Vec<_> = request.occurrences(config, start_time)?.collect();
                let subject = request.subject.clone();
                let student = request.student;

                let removed = self.delete_lessons_of(id);
                let mut created = 0;
                for occurrence in occurrences {
                    let lesson_id = LessonId(self.next_id());
                    self.lessons.insert(
                        lesson_id,
                        AllocatedLesson {
                            id: lesson_id,
                            request: id,
                            occurrence: occurrence.index,
                            date: occurrence.date,
                            time: occurrence.time,
                            subject: subject.clone(),
                            student,
                            tutor,
                        },
                    );
                    created += 1;
                }

                if let Some(request) = self.requests.get_mut(&id) {
                    request.tutor = Some(tutor);
                    request.start_time = Some(start_time);
                    request.status = LessonStatus::Allocated;
                }
                info!(request = %id, %tutor, created, removed, "allocated lesson request");
                Ok(created)
            }
            LessonStatus::Unallocated => {
                let removed = self.delete_lessons_of(id);
                if let Some(request) = self.requests.get_mut(&id) {
                    if tutor.is_some() {
                        request.tutor = tutor;
                    }
                    request.status = LessonStatus::Unallocated;
                }
                info!(request = %id, removed, "unallocated lesson request");
                Ok(0)
            }
        }
    }

    /// Delete a request together with all of its lessons.
    pub fn delete_request(&mut self, id: RequestId) -> Result<LessonRequest> {
        let request = self
            .requests
            .remove(&id)
            .ok_or_else(|| SchedulingError::NotFound(format!("lesson request {}", id)))?;
        let removed = self.delete_lessons_of(id);
        info!(request = %id, removed, "deleted lesson request");
        Ok(request)
    }

    fn delete_lessons_of(&mut self, request: RequestId) -> usize {
        let before = self.lessons.len();
        self.lessons.retain(|_, lesson| lesson.request != request);
        before - self.lessons.len()
    }

    // --- Allocated lessons ---

    /// Lessons of one request, in occurrence order.
    pub fn lessons_for_request(&self, request: RequestId) -> Vec<&AllocatedLesson> {
        let mut lessons: Vec<_> = self
            .lessons
            .values()
            .filter(|l| l.request == request)
            .collect();
        lessons.sort_by_key(|l| l.occurrence);
        lessons
    }

    /// Lessons taught by `tutor`, in date and time order.
    pub fn lessons_for_tutor(&self, tutor: UserId) -> Vec<&AllocatedLesson> {
        self.lessons_where(|l| l.tutor == tutor)
    }

    /// Lessons attended by `student`, in date and time order.
    pub fn lessons_for_student(&self, student: UserId) -> Vec<&AllocatedLesson> {
        self.lessons_where(|l| l.student == student)
    }

    fn lessons_where(&self, keep: impl Fn(&AllocatedLesson) -> bool) -> Vec<&AllocatedLesson> {
        let mut lessons: Vec<_> = self.lessons.values().filter(|l| keep(l)).collect();
        lessons.sort_by_key(|l| (l.date, l.time, l.request, l.occurrence));
        lessons
    }

    /// Cancel a single occurrence. The rest of the request stays allocated.
    pub fn cancel_lesson(&mut self, id: LessonId) -> Result<AllocatedLesson> {
        let lesson = self
            .lessons
            .remove(&id)
            .ok_or_else(|| SchedulingError::NotFound(format!("lesson {}", id)))?;
        info!(lesson = %id, request = %lesson.request, date = %lesson.date, "cancelled lesson");
        Ok(lesson)
    }

    // --- Availability ---

    /// Insert a block for (`user`, `weekday`), merging it with every existing
    /// block it overlaps or touches.
    ///
    /// # Errors
    /// Returns `SchedulingError::InvalidRange` if `start` is after `end`; the
    /// stored blocks are left unchanged.
    pub fn add_block(
        &mut self,
        user: UserId,
        weekday: Weekday,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<Schedule> {
        let block = TimeBlock::new(start, end)?;
        let id = ScheduleId(self.next_id());
        Ok(self.place_block(id, user, weekday, block, None))
    }

    /// Replace an existing block's day and times, merging as [`add_block`] does.
    /// The edited block keeps its id and is never merged with itself.
    ///
    /// [`add_block`]: SchedulingStore::add_block
    pub fn update_block(
        &mut self,
        id: ScheduleId,
        weekday: Weekday,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<Schedule> {
        let block = TimeBlock::new(start, end)?;
        let user = self
            .schedules
            .get(&id)
            .map(|s| s.user)
            .ok_or_else(|| SchedulingError::NotFound(format!("schedule {}", id)))?;
        Ok(self.place_block(id, user, weekday, block, Some(id)))
    }

    fn place_block(
        &mut self,
        id: ScheduleId,
        user: UserId,
        weekday: Weekday,
        block: TimeBlock,
        exclude: Option<ScheduleId>,
    ) -> Schedule {
        let existing: Vec<Schedule> = self
            .schedules
            .values()
            .filter(|s| s.user == user && s.weekday == weekday)
            .cloned()
            .collect();
        let plan = plan_merge(&existing, user, weekday, block, exclude);

        for absorbed in &plan.absorbed {
            self.schedules.remove(absorbed);
        }
        if !plan.absorbed.is_empty() {
            debug!(%user, day = weekday_label(weekday), absorbed = plan.absorbed.len(), "merged availability blocks");
        }

        let schedule = Schedule {
            id,
            user,
            weekday,
            block: plan.block,
        };
        self.schedules.insert(id, schedule.clone());
        info!(
            %user,
            day = weekday_label(weekday),
            start = %plan.block.start(),
            end = %plan.block.end(),
            "stored availability block"
        );
        schedule
    }

    pub fn remove_block(&mut self, id: ScheduleId) -> Result<Schedule> {
        let schedule = self
            .schedules
            .remove(&id)
            .ok_or_else(|| SchedulingError::NotFound(format!("schedule {}", id)))?;
        info!(schedule = %id, user = %schedule.user, "removed availability block");
        Ok(schedule)
    }

    /// All blocks of `user`, Sunday first, then by start time.
    pub fn blocks_for(&self, user: UserId) -> Vec<Schedule> {
        let mut blocks: Vec<Schedule> = self
            .schedules
            .values()
            .filter(|s| s.user == user)
            .cloned()
            .collect();
        sort_for_display(&mut blocks);
        blocks
    }
}
