//! Service modules for the collection cycle

pub mod duplicate_guard;
pub mod fetch;
pub mod genre;
pub mod holiday;
pub mod schedule;
pub mod stream_stats;
pub mod sun_times;
pub mod weather;

pub use duplicate_guard::{DuplicatePlayGuard, REPEAT_SENTINEL};
pub use fetch::{HttpPageFetcher, PageFetcher};
pub use genre::{GenreResolver, GenreSource};
pub use holiday::HolidayCalendar;
pub use schedule::{NowPlayingFeedSchedule, ProgrammeFeedSchedule, ScheduleSource};
pub use stream_stats::StreamStatsResolver;
pub use sun_times::SunTimesClient;
pub use weather::WeatherClient;
