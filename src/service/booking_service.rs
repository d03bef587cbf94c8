use std::sync::Arc;

use serde_json::Value;

use crate::clients::cal_client::{Attendee, BookingQuery, CalApi, CreateBookingBody};
use crate::error::BotError;
use crate::models::chat::ChatEntry;
use crate::service::tools::{
    CreateBookingArgs, FirstBookingArgs, ListBookingsArgs, RescheduleBookingArgs,
};

pub const CANCELLATION_REASON: &str = "Cancelled by user request via chat bot.";
pub const RESCHEDULING_REASON: &str = "User requested reschedule";

// The five booking operations. Each one appends exactly one function_call_output
// entry under the caller's correlation id; response bodies (success or error)
// go into the log as-is for the model to interpret.
pub struct BookingService {
    api: Arc<dyn CalApi>,
    event_type_id: u64,
}

impl BookingService {
    pub fn new(api: Arc<dyn CalApi>, event_type_id: u64) -> Self {
        Self { api, event_type_id }
    }

    pub async fn list_all_upcoming_bookings(
        &self,
        log: &mut Vec<ChatEntry>,
        call_id: &str,
        args: ListBookingsArgs,
    ) -> Result<(), BotError> {
        let query = BookingQuery {
            attendee_email: args.attendee_email,
            after_start: None,
            take: None,
        };
        let bookings = self.api.get_bookings(&query).await?;
        log.push(ChatEntry::function_output(call_id, bookings));
        Ok(())
    }

    pub async fn create_booking(
        &self,
        log: &mut Vec<ChatEntry>,
        call_id: &str,
        args: CreateBookingArgs,
    ) -> Result<(), BotError> {
        let body = CreateBookingBody {
            attendee: Attendee {
                name: args.attendee_name,
                email: args.attendee_email,
                time_zone: args.time_zone,
                phone_number: args.phone_number,
            },
            start: args.start_time,
            event_type_id: self.event_type_id,
        };
        let booking = self.api.create_booking(&body).await?;
        log.push(ChatEntry::function_output(call_id, booking));
        Ok(())
    }

    pub async fn look_up_first_booking(
        &self,
        log: &mut Vec<ChatEntry>,
        call_id: &str,
        args: FirstBookingArgs,
    ) -> Result<(), BotError> {
        let bookings = self
            .api
            .get_bookings(&first_booking_query(&args.attendee_email, &args.scheduled_start_time))
            .await?;
        log.push(ChatEntry::function_output(call_id, bookings));
        Ok(())
    }

    pub async fn cancel_first_booking(
        &self,
        log: &mut Vec<ChatEntry>,
        call_id: &str,
        args: FirstBookingArgs,
    ) -> Result<(), BotError> {
        let bookings = self
            .api
            .get_bookings(&first_booking_query(&args.attendee_email, &args.scheduled_start_time))
            .await?;
        let Some(uid) = first_booking_uid(&bookings) else {
            // Nothing matched: hand the lookup result back without cancelling.
            log.push(ChatEntry::function_output(call_id, bookings));
            return Ok(());
        };

        let result = self.api.cancel_booking(&uid, CANCELLATION_REASON).await?;
        log.push(ChatEntry::function_output(call_id, result));
        Ok(())
    }

    pub async fn reschedule_first_booking(
        &self,
        log: &mut Vec<ChatEntry>,
        call_id: &str,
        args: RescheduleBookingArgs,
    ) -> Result<(), BotError> {
        let bookings = self
            .api
            .get_bookings(&first_booking_query(&args.attendee_email, &args.scheduled_start_time))
            .await?;
        let Some(uid) = first_booking_uid(&bookings) else {
            log.push(ChatEntry::function_output(call_id, bookings));
            return Ok(());
        };

        let result = self
            .api
            .reschedule_booking(&uid, &args.new_start_time, RESCHEDULING_REASON)
            .await?;
        log.push(ChatEntry::function_output(call_id, result));
        Ok(())
    }
}

fn first_booking_query(attendee_email: &str, scheduled_start_time: &str) -> BookingQuery {
    BookingQuery {
        attendee_email: attendee_email.to_string(),
        after_start: Some(scheduled_start_time.to_string()),
        take: Some(1),
    }
}

// Unparseable bodies and bodies without a first uid are treated as "no booking
// found"; the raw body still reaches the model through the early-return path.
fn first_booking_uid(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    parsed
        .pointer("/data/0/uid")
        .and_then(Value::as_str)
        .map(str::to_string)
}
