pub mod company;
pub mod internship;
pub mod message;
pub mod task;
pub mod user;

pub use company::Company;
pub use internship::{
    Application, ApplicationStatus, Internship, InternshipStatus, InternshipUpdate, NewApplication,
    NewInternship,
};
pub use message::{Message, NewMessage};
pub use task::{
    NewSubmission, NewTask, ReviewOutcome, Submission, SubmissionStatus, Task, TaskStatus,
    TaskUpdate,
};
pub use user::{NewUser, SanitizedUser, User};
