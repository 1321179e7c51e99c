pub mod workflow_dto;
pub mod workflow_route;
