pub mod appointment;
pub mod booking;
pub mod repository;

pub use appointment::AppointmentService;
pub use booking::{BookingRepository, BookingService};
pub use repository::SupabaseBookingRepository;
