/// Notifications emitted when entity classification actually changes.
/// Repeated calls that change nothing emit nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameSignal {
    /// A name became a verified player for the first time
    NewVerifiedPlayer { name: String },
    /// A name became a verified pet for the first time
    NewVerifiedPet { name: String },
    /// A pet was assigned an owner different from its previous one
    PetMappingChanged { pet: String, owner: String },
    /// A name was seen acting as an NPC for the first time
    NewNonPlayer { name: String },
    /// A name previously tracked as an NPC turned out to be a player or pet
    RemovedNonPlayer { name: String },
    /// Active NPC and candidate tracking was cleared
    ActiveDataCleared,
}
