//! CloudFormation templates for the stacks the integration owns directly

/// Account New Relic assumes integration roles from
pub const NEW_RELIC_AWS_ACCOUNT: &str = "754728514883";

/// Serverless Application Repository app providing the log ingestion function
pub const LOG_INGESTION_APPLICATION_ID: &str =
    "arn:aws:serverlessrepo:us-east-1:463657938898:applications/NewRelic-log-ingestion";

/// Integration role granting New Relic read access to Lambda metadata
pub const INTEGRATION_ROLE_TEMPLATE: &str = r#"AWSTemplateFormatVersion: '2010-09-09'
Description: New Relic AWS Lambda integration role
Parameters:
  NewRelicAccountNumber:
    Type: String
    Description: New Relic account number, used as the role's external id
  PolicyName:
    Type: String
    Default: ''
    Description: Optional managed policy ARN replacing the default read-only policy
Conditions:
  UseCustomPolicy: !Not [!Equals ['', !Ref PolicyName]]
Resources:
  Role:
    Type: AWS::IAM::Role
    Properties:
      RoleName: !Sub NewRelicLambdaIntegrationRole_${NewRelicAccountNumber}
      AssumeRolePolicyDocument:
        Version: '2012-10-17'
        Statement:
          - Effect: Allow
            Principal:
              AWS: arn:aws:iam::754728514883:root
            Action: sts:AssumeRole
            Condition:
              StringEquals:
                sts:ExternalId: !Ref NewRelicAccountNumber
      ManagedPolicyArns: !If
        - UseCustomPolicy
        - [!Ref PolicyName]
        - !Ref AWS::NoValue
      Policies: !If
        - UseCustomPolicy
        - !Ref AWS::NoValue
        - - PolicyName: NewRelicLambdaIntegrationReadOnly
            PolicyDocument:
              Version: '2012-10-17'
              Statement:
                - Effect: Allow
                  Action:
                    - cloudwatch:GetMetricData
                    - cloudwatch:GetMetricStatistics
                    - cloudwatch:ListMetrics
                    - lambda:GetAccountSettings
                    - lambda:ListAliases
                    - lambda:ListEventSourceMappings
                    - lambda:ListFunctions
                    - lambda:ListTags
                    - tag:GetResources
                  Resource: '*'
Outputs:
  IntegrationRoleArn:
    Value: !GetAtt Role.Arn
"#;

/// Managed secret holding the license key, plus a policy granting read access
pub const LICENSE_KEY_SECRET_TEMPLATE: &str = r#"AWSTemplateFormatVersion: '2010-09-09'
Description: New Relic license key managed secret
Parameters:
  LicenseKey:
    Type: String
    NoEcho: true
    Description: New Relic ingest license key
Resources:
  LicenseKeySecret:
    Type: AWS::SecretsManager::Secret
    Properties:
      Name: NEW_RELIC_LICENSE_KEY
      Description: The New Relic license key, for sending telemetry
      SecretString: !Sub '{"LicenseKey": "${LicenseKey}"}'
  ViewNewRelicLicenseKeyPolicy:
    Type: AWS::IAM::ManagedPolicy
    Properties:
      ManagedPolicyName: !Sub NewRelic-ViewLicenseKey-${AWS::Region}
      PolicyDocument:
        Version: '2012-10-17'
        Statement:
          - Effect: Allow
            Action:
              - secretsmanager:GetSecretValue
            Resource: !Ref LicenseKeySecret
Outputs:
  LicenseKeySecretARN:
    Value: !Ref LicenseKeySecret
    Export:
      Name: NewRelic-LicenseKeySecretARN
  ViewPolicyARN:
    Value: !Ref ViewNewRelicLicenseKeyPolicy
    Export:
      Name: NewRelic-ViewLicenseKeyPolicyARN
"#;
