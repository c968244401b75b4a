pub mod availability;
pub mod bulk_upload;
pub mod doctor;
pub mod repository;

pub use availability::AvailabilityService;
pub use doctor::DoctorService;
pub use repository::SupabaseSlotRepository;
