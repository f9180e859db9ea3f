use crate::models::OrgProfile;

/// Compose the editable introduction email draft shown to the acting user
/// after a fresh match. Nothing is persisted until the user sends it.
pub fn compose_intro_draft(mine: &OrgProfile, theirs: &OrgProfile) -> String {
    let my_looking_for = mine.looking_for_text("new opportunities");
    let their_looking_for = theirs.looking_for_text("potential collaborations");
    let my_email = mine.email.as_deref().unwrap_or("[Your Email]");

    format!(
        "Subject: Exploring Synergies: {my_company} & {their_company}\n\
         \n\
         Dear {their_company} Team,\n\
         \n\
         My name is [Your Name] from {my_company}. We are a company in the {my_industry} sector, \
         currently seeking {my_looking_for}.\n\
         \n\
         I came across your profile on B2B Connect and was impressed by your work in \
         {their_industry}, particularly your focus on {their_looking_for}. I believe there could \
         be some exciting potential for collaboration between our companies.\n\
         \n\
         Would you be open to a brief virtual coffee chat next week to explore how we might be \
         able to support each other's goals?\n\
         \n\
         Looking forward to hearing from you.\n\
         \n\
         Best regards,\n\
         \n\
         [Your Name]\n\
         [Your Title]\n\
         {my_company}\n\
         {my_email}",
        my_company = mine.company_name,
        their_company = theirs.company_name,
        my_industry = mine.industry,
        their_industry = theirs.industry,
    )
}

/// Compose the automated greeting sequence sent on behalf of one party.
/// The two messages are appended in order, so their channel positions are
/// strictly increasing.
pub fn compose_opening_sequence(
    mine: &OrgProfile,
    theirs: &OrgProfile,
    assistant_name: &str,
) -> [String; 2] {
    let my_looking_for = mine.looking_for_text("new opportunities");

    [
        format!(
            "Hello {} team! I'm the {} for {}. We're very interested in your work in {}.",
            theirs.company_name, assistant_name, mine.company_name, theirs.industry
        ),
        format!(
            "{} is looking for {} and we see a potential synergy. Would you be open to a quick chat?",
            mine.company_name, my_looking_for
        ),
    ]
}
